//! Core types for the gaze estimation engine
//!
//! This module defines the data that flows through the engine: per-frame gaze
//! samples, screen points, calibration pairs, and the frozen calibration set
//! consumed by the coordinate mapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2D point, either in screen coordinates (host display/window space) or in
/// frame-pixel coordinates (top-left origin), depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One frame's extracted gaze features.
///
/// Pupil positions are in the source frame's pixel space, top-left origin,
/// horizontally mirrored to match a user-facing mirror display. Head-pose
/// angles are in radians (right-handed convention).
///
/// All five fields are always populated: a frame with any missing landmark is
/// discarded by the producer (see [`crate::frame::FrameFeatures`]) rather
/// than delivered as a partial sample. Samples are immutable and superseded
/// every frame; they are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Detected left pupil position (frame pixels, mirrored)
    pub left_pupil: Point,
    /// Detected right pupil position (frame pixels, mirrored)
    pub right_pupil: Point,
    /// Head roll angle - rotation around the Z axis (radians)
    pub roll: f64,
    /// Head pitch angle - rotation around the X axis (radians)
    pub pitch: f64,
    /// Head yaw angle - rotation around the Y axis (radians)
    pub yaw: f64,
}

impl GazeSample {
    pub fn new(left_pupil: Point, right_pupil: Point, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            left_pupil,
            right_pupil,
            roll,
            pitch,
            yaw,
        }
    }

    /// Midpoint of the two pupils, the 2D feature used by the distance metric.
    ///
    /// Head-pose angles are carried on the sample but do not enter the metric
    /// (see [`crate::metric`]).
    pub fn pupil_midpoint(&self) -> Point {
        Point::new(
            (self.left_pupil.x + self.right_pupil.x) / 2.0,
            (self.left_pupil.y + self.right_pupil.y) / 2.0,
        )
    }
}

/// A known on-screen target location paired with the gaze sample observed
/// while the user fixated it. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    /// Where the calibration target was shown (screen coordinates)
    pub screen_point: Point,
    /// The gaze sample captured when the user confirmed fixation
    pub sample: GazeSample,
}

impl CalibrationPair {
    pub fn new(screen_point: Point, sample: GazeSample) -> Self {
        Self {
            screen_point,
            sample,
        }
    }
}

/// The frozen output of a finished calibration session.
///
/// A read-only reference table for the regression: replaced wholesale when a
/// new session finishes, never edited incrementally. Pairs are in target
/// presentation order. Provenance fields identify which session produced the
/// set and when it was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    /// Identifier of the session that produced this set
    pub session_id: Uuid,
    /// When the session finished (UTC)
    pub completed_at: DateTime<Utc>,
    /// Collected pairs, in target presentation order
    pub pairs: Vec<CalibrationPair>,
}

impl CalibrationSet {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
