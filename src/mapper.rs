//! Coordinate mapper
//!
//! Estimates a screen coordinate from a live gaze sample by weighted
//! k-nearest-neighbor regression over the calibration pairs: neighbors are
//! ranked by the pupil-midpoint distance metric and their screen targets are
//! averaged with inverse-distance weights, so the closest calibration point
//! dominates the estimate.
//!
//! Estimation is pure and deterministic: identical inputs always produce the
//! identical output (ties in distance are broken by calibration order via a
//! stable sort).

use std::cmp::Ordering;

use crate::error::GazeError;
use crate::metric::distance;
use crate::types::{CalibrationPair, GazeSample, Point};

/// Default number of neighbors used for regression
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Guard against division by zero when a live sample exactly matches a
/// calibration sample
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Weighted k-nearest-neighbor regressor from gaze samples to screen points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    k: usize,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            k: DEFAULT_NEIGHBORS,
        }
    }
}

impl CoordinateMapper {
    /// Create a mapper using `k` neighbors. `k == 0` is rejected.
    pub fn new(k: usize) -> Result<Self, GazeError> {
        if k == 0 {
            return Err(GazeError::InvalidNeighborCount(k));
        }
        Ok(Self { k })
    }

    pub fn neighbors(&self) -> usize {
        self.k
    }

    /// Estimate the screen coordinate the user is looking at.
    ///
    /// Returns `None` ("no estimate") when fewer than `k` calibration pairs
    /// exist, or in the degenerate case where the total regression weight
    /// collapses and no calibration sample exactly matches the live sample.
    /// `None` means "draw nothing" for the consumer, never an error.
    pub fn estimate(&self, live: &GazeSample, calibration: &[CalibrationPair]) -> Option<Point> {
        if calibration.len() < self.k {
            return None;
        }

        let mut ranked: Vec<(&CalibrationPair, f64)> = calibration
            .iter()
            .map(|pair| (pair, distance(live, &pair.sample)))
            .collect();

        // Stable sort keeps calibration order for equal distances, which
        // makes tie-breaking reproducible.
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let nearest = &ranked[..self.k];

        let mut total_weight = 0.0;
        let mut weighted_x = 0.0;
        let mut weighted_y = 0.0;

        for (pair, dist) in nearest {
            let weight = 1.0 / (dist + WEIGHT_EPSILON);
            weighted_x += pair.screen_point.x * weight;
            weighted_y += pair.screen_point.y * weight;
            total_weight += weight;
        }

        if total_weight <= WEIGHT_EPSILON {
            // Numerically collapsed weights. If the live sample exactly
            // matches a neighbor, that neighbor's target is the answer.
            return nearest
                .iter()
                .find(|(_, dist)| *dist < WEIGHT_EPSILON)
                .map(|(pair, _)| pair.screen_point);
        }

        Some(Point::new(weighted_x / total_weight, weighted_y / total_weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn sample_at(mid_x: f64, mid_y: f64) -> GazeSample {
        GazeSample::new(
            Point::new(mid_x - 15.0, mid_y),
            Point::new(mid_x + 15.0, mid_y),
            0.0,
            0.0,
            0.0,
        )
    }

    fn pair(target_x: f64, target_y: f64, mid_x: f64, mid_y: f64) -> CalibrationPair {
        CalibrationPair::new(Point::new(target_x, target_y), sample_at(mid_x, mid_y))
    }

    #[test]
    fn test_zero_neighbors_rejected() {
        assert!(matches!(
            CoordinateMapper::new(0),
            Err(GazeError::InvalidNeighborCount(0))
        ));
    }

    #[test]
    fn test_default_uses_three_neighbors() {
        assert_eq!(CoordinateMapper::default().neighbors(), 3);
    }

    #[test]
    fn test_insufficient_calibration_returns_none() {
        let mapper = CoordinateMapper::default();
        let calibration = vec![pair(0.0, 0.0, 0.0, 0.0), pair(100.0, 0.0, 10.0, 0.0)];
        assert_eq!(mapper.estimate(&sample_at(5.0, 0.0), &calibration), None);
        assert_eq!(mapper.estimate(&sample_at(1000.0, 1000.0), &calibration), None);
    }

    #[test]
    fn test_empty_calibration_returns_none() {
        let mapper = CoordinateMapper::default();
        assert_eq!(mapper.estimate(&sample_at(0.0, 0.0), &[]), None);
    }

    #[test]
    fn test_exact_match_dominates() {
        // Live midpoint coincides with the first pair; inverse-distance
        // weighting drives the estimate onto that pair's target.
        let mapper = CoordinateMapper::default();
        let calibration = vec![
            pair(0.0, 0.0, 0.0, 0.0),
            pair(100.0, 0.0, 10.0, 0.0),
            pair(0.0, 100.0, 0.0, 10.0),
            pair(100.0, 100.0, 10.0, 10.0),
        ];

        let estimate = mapper
            .estimate(&sample_at(0.0, 0.0), &calibration)
            .expect("estimate should exist");
        assert!(estimate.x.abs() < 1e-3, "x = {}", estimate.x);
        assert!(estimate.y.abs() < 1e-3, "y = {}", estimate.y);
    }

    #[test]
    fn test_closer_neighbor_weighs_more() {
        // Live sample sits much closer to the first target's sample, so the
        // estimate must land nearer to the first target than the second.
        let mapper = CoordinateMapper::new(2).unwrap();
        let calibration = vec![pair(0.0, 0.0, 1.0, 0.0), pair(100.0, 0.0, 50.0, 0.0)];

        let estimate = mapper
            .estimate(&sample_at(0.0, 0.0), &calibration)
            .expect("estimate should exist");
        assert!(estimate.x < 50.0, "x = {}", estimate.x);
    }

    #[test]
    fn test_weight_monotonicity() {
        // Directly check that weights decrease with distance for a spread of
        // distances against a fixed live sample.
        let live = sample_at(0.0, 0.0);
        let distances: Vec<f64> = [1.0, 2.0, 5.0, 40.0]
            .iter()
            .map(|d| distance(&live, &sample_at(*d, 0.0)))
            .collect();
        let weights: Vec<f64> = distances.iter().map(|d| 1.0 / (d + WEIGHT_EPSILON)).collect();
        for w in weights.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }

    #[test]
    fn test_equidistant_neighbors_average_targets() {
        // Two neighbors at identical distance on opposite sides get equal
        // weight, so the estimate is the midpoint of their targets.
        let mapper = CoordinateMapper::new(2).unwrap();
        let calibration = vec![pair(0.0, 0.0, -10.0, 0.0), pair(100.0, 0.0, 10.0, 0.0)];

        let estimate = mapper
            .estimate(&sample_at(0.0, 0.0), &calibration)
            .expect("estimate should exist");
        assert!((estimate.x - 50.0).abs() < 1e-9, "x = {}", estimate.x);
        assert!(estimate.y.abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolved_by_calibration_order() {
        // Four calibration samples, all at the same distance from the live
        // sample. With k = 2 the first two pairs in calibration order must be
        // selected, so the estimate is the average of their targets only.
        let mapper = CoordinateMapper::new(2).unwrap();
        let calibration = vec![
            pair(0.0, 0.0, 10.0, 0.0),
            pair(100.0, 0.0, -10.0, 0.0),
            pair(500.0, 500.0, 0.0, 10.0),
            pair(900.0, 900.0, 0.0, -10.0),
        ];

        let estimate = mapper
            .estimate(&sample_at(0.0, 0.0), &calibration)
            .expect("estimate should exist");
        assert!((estimate.x - 50.0).abs() < 1e-9, "x = {}", estimate.x);
        assert!(estimate.y.abs() < 1e-9, "y = {}", estimate.y);
    }

    #[test]
    fn test_collapsed_weights_yield_none() {
        // All three neighbors sit ~1e7 px away, so each weight is ~1e-7 and
        // the total stays at or below the epsilon guard. No neighbor matches
        // the live sample exactly, so there is no estimate.
        let mapper = CoordinateMapper::default();
        let calibration = vec![
            pair(100.0, 100.0, 1e7, 0.0),
            pair(500.0, 100.0, 0.0, 1e7),
            pair(300.0, 300.0, -1e7, 0.0),
        ];
        assert_eq!(mapper.estimate(&sample_at(0.0, 0.0), &calibration), None);
    }

    #[test]
    fn test_exact_match_among_distant_neighbors_estimates() {
        // One coincident neighbor keeps the total weight healthy even when
        // the other neighbors are astronomically far, so the regular
        // weighted path answers with that neighbor's target.
        let mapper = CoordinateMapper::default();
        let calibration = vec![
            pair(250.0, 400.0, 0.0, 0.0),
            pair(500.0, 100.0, 1e7, 0.0),
            pair(300.0, 300.0, 0.0, 1e7),
        ];
        let estimate = mapper
            .estimate(&sample_at(0.0, 0.0), &calibration)
            .expect("estimate should exist");
        assert!((estimate.x - 250.0).abs() < 1e-3, "x = {}", estimate.x);
        assert!((estimate.y - 400.0).abs() < 1e-3, "y = {}", estimate.y);
    }

    #[test]
    fn test_determinism() {
        let mapper = CoordinateMapper::default();
        let calibration = vec![
            pair(100.0, 100.0, 300.0, 250.0),
            pair(500.0, 100.0, 350.0, 250.0),
            pair(500.0, 500.0, 350.0, 300.0),
            pair(100.0, 500.0, 300.0, 300.0),
            pair(300.0, 300.0, 325.0, 275.0),
        ];
        let live = sample_at(330.0, 270.0);

        let first = mapper.estimate(&live, &calibration);
        for _ in 0..10 {
            assert_eq!(mapper.estimate(&live, &calibration), first);
        }
    }
}
