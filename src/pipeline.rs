//! Pipeline orchestration
//!
//! [`GazeProcessor`] is the engine's public entry point for hosts: it owns
//! the calibration session, the currently published calibration set, the
//! coordinate mapper, and the most recent live sample, and wires their
//! interactions so the host never mutates any of them directly.
//!
//! Concurrency contract: the processor is single-writer state. A
//! multi-threaded host must funnel all calls that take `&mut self` through
//! one synchronization domain (a dedicated task, or a mutex). Frames arrive
//! at camera rate with no back-pressure; only the most recent sample is
//! retained, older ones are discarded, never queued. For estimation off the
//! writer thread, take a [`GazeProcessor::calibration_snapshot`] and call
//! [`CoordinateMapper::estimate`] on it directly - estimation is pure.

use crate::error::GazeError;
use crate::mapper::CoordinateMapper;
use crate::session::{CalibrationSession, RecordOutcome};
use crate::types::{CalibrationSet, GazeSample, Point};

/// Stateful calibration-and-mapping engine.
///
/// Estimation is disabled (every frame yields "no estimate") until a
/// calibration session finishes, and again after one is started or
/// cancelled.
#[derive(Debug, Clone)]
pub struct GazeProcessor {
    session: CalibrationSession,
    mapper: CoordinateMapper,
    calibration: Option<CalibrationSet>,
    latest_sample: Option<GazeSample>,
}

impl Default for GazeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GazeProcessor {
    /// Create a processor with the default five-target plan and the default
    /// neighbor count.
    pub fn new() -> Self {
        Self {
            session: CalibrationSession::default(),
            mapper: CoordinateMapper::default(),
            calibration: None,
            latest_sample: None,
        }
    }

    /// Create a processor with a custom target plan and neighbor count.
    /// Rejects `k == 0`.
    pub fn with_config(targets: Vec<Point>, k: usize) -> Result<Self, GazeError> {
        Ok(Self {
            session: CalibrationSession::new(targets),
            mapper: CoordinateMapper::new(k)?,
            calibration: None,
            latest_sample: None,
        })
    }

    /// Accept one frame's sample and return the live estimate, if any.
    ///
    /// The sample replaces any previously stored one. Returns `None` while
    /// uncalibrated (including during a calibration run) or when the mapper
    /// has no estimate; the consumer should draw nothing in that case.
    pub fn submit_sample(&mut self, sample: GazeSample) -> Option<Point> {
        self.latest_sample = Some(sample);
        self.estimate(&sample)
    }

    /// Estimate the screen coordinate for a live sample against the current
    /// calibration set. Pure with respect to processor state.
    pub fn estimate(&self, live: &GazeSample) -> Option<Point> {
        let calibration = self.calibration.as_ref()?;
        self.mapper.estimate(live, &calibration.pairs)
    }

    /// Begin a calibration run. Any previously published calibration set is
    /// discarded immediately, so estimation is disabled until the run
    /// finishes.
    pub fn start_calibration(&mut self) {
        self.calibration = None;
        self.session.start();
    }

    /// The calibration target currently being presented, if any
    pub fn current_target(&self) -> Option<Point> {
        self.session.current_target()
    }

    pub fn is_calibrating(&self) -> bool {
        self.session.is_active()
    }

    /// Pair the given sample with the current target. Completing the plan
    /// publishes the new calibration set and re-enables estimation.
    pub fn record(&mut self, sample: GazeSample) -> Result<RecordOutcome, GazeError> {
        let outcome = self.session.record(sample)?;
        if let RecordOutcome::Completed(set) = &outcome {
            self.calibration = Some(set.clone());
        }
        Ok(outcome)
    }

    /// Record using the most recent submitted sample ("the user is looking
    /// here now"). Fails with [`GazeError::NoSample`] if no frame has been
    /// delivered yet.
    pub fn record_latest(&mut self) -> Result<RecordOutcome, GazeError> {
        let sample = self.latest_sample.ok_or(GazeError::NoSample)?;
        self.record(sample)
    }

    /// Finalize the current run early, publishing whatever was collected.
    pub fn finish_calibration(&mut self) -> Result<CalibrationSet, GazeError> {
        let set = self.session.finish()?;
        self.calibration = Some(set.clone());
        Ok(set)
    }

    /// Abandon the current run. The calibration set becomes empty and
    /// estimation stays disabled until a future run finishes.
    pub fn cancel_calibration(&mut self) -> Result<(), GazeError> {
        self.session.cancel()?;
        self.calibration = None;
        Ok(())
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// The currently published calibration set, if any
    pub fn calibration(&self) -> Option<&CalibrationSet> {
        self.calibration.as_ref()
    }

    /// Clone of the published set, for estimation outside the writer's
    /// synchronization domain
    pub fn calibration_snapshot(&self) -> Option<CalibrationSet> {
        self.calibration.clone()
    }

    /// The most recent sample delivered via `submit_sample`, if any
    pub fn latest_sample(&self) -> Option<GazeSample> {
        self.latest_sample
    }

    /// Access to the underlying session, for hosts that render progress
    pub fn session(&self) -> &CalibrationSession {
        &self.session
    }
}
