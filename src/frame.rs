//! Frame feature ingest
//!
//! Face trackers report per-frame features independently: any landmark or
//! pose angle can be missing on a given frame. The engine's contract is
//! all-or-nothing, so this adapter either assembles a complete
//! [`GazeSample`] or rejects the frame naming the missing feature. A
//! rejected frame is discarded by the host; it never becomes a partial
//! sample.
//!
//! Mirroring also happens here: detection runs on the raw camera frame, but
//! the engine expects coordinates flipped horizontally to match the
//! user-facing mirror display.

use serde::{Deserialize, Serialize};

use crate::error::GazeError;
use crate::types::{GazeSample, Point};

/// Raw per-frame output of an external face tracker, before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatures {
    /// Detected left pupil (frame pixels, top-left origin)
    pub left_pupil: Option<Point>,
    /// Detected right pupil (frame pixels, top-left origin)
    pub right_pupil: Option<Point>,
    /// Head roll (radians)
    pub roll: Option<f64>,
    /// Head pitch (radians)
    pub pitch: Option<f64>,
    /// Head yaw (radians)
    pub yaw: Option<f64>,
}

impl FrameFeatures {
    /// Parse frame features from a JSON object, as delivered over the FFI
    /// boundary or an NDJSON recording. Absent fields stay absent; the
    /// all-or-nothing check happens in [`FrameFeatures::into_sample`].
    pub fn from_json(json: &str) -> Result<Self, GazeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flip pupil x-coordinates for a mirror display. `frame_width` is the
    /// source frame width in pixels.
    pub fn mirrored(self, frame_width: f64) -> Self {
        let flip = |p: Point| Point::new(frame_width - p.x, p.y);
        Self {
            left_pupil: self.left_pupil.map(flip),
            right_pupil: self.right_pupil.map(flip),
            ..self
        }
    }

    /// Assemble a complete sample, or reject the frame.
    ///
    /// The error names the first missing feature so hosts can log what their
    /// tracker failed to deliver.
    pub fn into_sample(self) -> Result<GazeSample, GazeError> {
        let left_pupil = self
            .left_pupil
            .ok_or(GazeError::IncompleteFrame("left_pupil"))?;
        let right_pupil = self
            .right_pupil
            .ok_or(GazeError::IncompleteFrame("right_pupil"))?;
        let roll = self.roll.ok_or(GazeError::IncompleteFrame("roll"))?;
        let pitch = self.pitch.ok_or(GazeError::IncompleteFrame("pitch"))?;
        let yaw = self.yaw.ok_or(GazeError::IncompleteFrame("yaw"))?;

        Ok(GazeSample::new(left_pupil, right_pupil, roll, pitch, yaw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complete_features() -> FrameFeatures {
        FrameFeatures {
            left_pupil: Some(Point::new(880.0, 520.0)),
            right_pupil: Some(Point::new(940.0, 518.0)),
            roll: Some(0.02),
            pitch: Some(-0.05),
            yaw: Some(0.1),
        }
    }

    #[test]
    fn test_complete_frame_becomes_sample() {
        let sample = complete_features().into_sample().unwrap();
        assert_eq!(sample.left_pupil, Point::new(880.0, 520.0));
        assert_eq!(sample.right_pupil, Point::new(940.0, 518.0));
        assert_eq!(sample.yaw, 0.1);
    }

    #[test]
    fn test_missing_pupil_rejects_frame() {
        let features = FrameFeatures {
            right_pupil: None,
            ..complete_features()
        };
        assert!(matches!(
            features.into_sample(),
            Err(GazeError::IncompleteFrame("right_pupil"))
        ));
    }

    #[test]
    fn test_missing_pose_angle_rejects_frame() {
        let features = FrameFeatures {
            pitch: None,
            ..complete_features()
        };
        assert!(matches!(
            features.into_sample(),
            Err(GazeError::IncompleteFrame("pitch"))
        ));
    }

    #[test]
    fn test_empty_frame_rejects_on_first_missing_field() {
        assert!(matches!(
            FrameFeatures::default().into_sample(),
            Err(GazeError::IncompleteFrame("left_pupil"))
        ));
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        assert!(matches!(
            FrameFeatures::from_json("{not json"),
            Err(GazeError::JsonError(_))
        ));
    }

    #[test]
    fn test_json_frame_round_trip() {
        let json = r#"{"left_pupil":{"x":880.0,"y":520.0},"right_pupil":{"x":940.0,"y":518.0},"roll":0.02,"pitch":-0.05,"yaw":0.1}"#;
        let features = FrameFeatures::from_json(json).unwrap();
        assert_eq!(features, complete_features());
    }

    #[test]
    fn test_mirroring_flips_x_only() {
        let mirrored = complete_features().mirrored(1920.0);
        assert_eq!(mirrored.left_pupil, Some(Point::new(1040.0, 520.0)));
        assert_eq!(mirrored.right_pupil, Some(Point::new(980.0, 518.0)));
        assert_eq!(mirrored.roll, Some(0.02));
    }

    #[test]
    fn test_mirroring_missing_fields_stays_missing() {
        let features = FrameFeatures {
            left_pupil: None,
            ..complete_features()
        };
        assert_eq!(features.mirrored(1920.0).left_pupil, None);
    }
}
