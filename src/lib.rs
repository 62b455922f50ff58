//! Gazekit - calibration-and-mapping engine for webcam gaze estimation
//!
//! Gazekit turns low-dimensional per-frame gaze features (pupil positions and
//! head pose, produced by an external face tracker) into screen-coordinate
//! estimates: a short supervised calibration sequence pairs on-screen targets
//! with observed samples, then every subsequent frame is mapped by
//! inverse-distance-weighted k-nearest-neighbor regression over those pairs.
//!
//! ## Modules
//!
//! - **types**: gaze samples, calibration pairs, the frozen calibration set
//! - **metric**: pupil-midpoint distance between samples
//! - **mapper**: weighted k-NN screen-coordinate regression
//! - **session**: calibration state machine (start / record / cancel)
//! - **frame**: all-or-nothing frame-feature ingest and mirroring
//! - **pipeline**: `GazeProcessor`, the stateful single-writer entry point
//!
//! Camera capture, face/landmark detection, and rendering are the host's
//! concern; the engine only consumes complete samples and produces points or
//! "no estimate".

pub mod error;
pub mod frame;
pub mod mapper;
pub mod metric;
pub mod pipeline;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::GazeError;
pub use frame::FrameFeatures;
pub use mapper::{CoordinateMapper, DEFAULT_NEIGHBORS};
pub use pipeline::GazeProcessor;
pub use session::{default_target_plan, CalibrationSession, RecordOutcome};
pub use types::{CalibrationPair, CalibrationSet, GazeSample, Point};

/// Engine version embedded in CLI output
pub const GAZEKIT_VERSION: &str = env!("CARGO_PKG_VERSION");
