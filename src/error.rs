//! Error types for the gaze engine
//!
//! The engine never raises a fatal error: insufficient calibration data and
//! degenerate regression weights degrade to "no estimate" (`None`) rather
//! than an error. The variants here cover host sequencing bugs, rejected
//! configuration, and ingest failures.

use thiserror::Error;

/// Errors that can occur while calibrating or ingesting frames
#[derive(Debug, Error)]
pub enum GazeError {
    /// `record` was called while no calibration target is being presented.
    /// Session state is left unchanged.
    #[error("No active calibration target")]
    NoActiveTarget,

    /// `cancel` or `finish` was called on a session that is not active
    #[error("Calibration session is not active")]
    SessionInactive,

    /// Neighbor count for the mapper must be at least 1
    #[error("Invalid neighbor count: {0} (must be at least 1)")]
    InvalidNeighborCount(usize),

    /// A recording step was requested before any gaze sample arrived
    #[error("No gaze sample available yet")]
    NoSample,

    /// A frame was delivered with a required feature missing; the frame must
    /// be discarded, never turned into a partial sample
    #[error("Incomplete frame: missing {0}")]
    IncompleteFrame(&'static str),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
