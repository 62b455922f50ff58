//! Gaze sample distance metric
//!
//! Dissimilarity between two gaze samples is the planar Euclidean distance
//! between their pupil midpoints. Head-pose angles are captured on the sample
//! but do not enter the metric, so two samples with identical midpoints and
//! different poses compare as identical. The metric is symmetric and zero
//! exactly when the midpoints coincide.

use crate::types::GazeSample;

/// Distance between two gaze samples (frame pixels, always non-negative).
pub fn distance(a: &GazeSample, b: &GazeSample) -> f64 {
    a.pupil_midpoint().distance_to(b.pupil_midpoint())
}
