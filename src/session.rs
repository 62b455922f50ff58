//! Calibration session state machine
//!
//! A session walks the user through an ordered plan of on-screen targets,
//! pairing each target with the gaze sample observed while the user fixated
//! it. Recording the last target finishes the session synchronously and
//! publishes the collected pairs as a [`CalibrationSet`]; cancelling discards
//! everything collected so far.
//!
//! Session state is single-writer: the host must funnel `start`, `record`,
//! and `cancel` through one synchronization domain. Queries are pure.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::GazeError;
use crate::types::{CalibrationPair, CalibrationSet, GazeSample, Point};

/// The default calibration plan: four corner-ish regions plus center, in
/// host display coordinates.
pub fn default_target_plan() -> Vec<Point> {
    vec![
        Point::new(100.0, 100.0), // top-left area
        Point::new(500.0, 100.0), // top-right area
        Point::new(500.0, 500.0), // bottom-right area
        Point::new(100.0, 500.0), // bottom-left area
        Point::new(300.0, 300.0), // center area
    ]
}

/// What a successful `record` did to the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The pair was collected and the session moved to the next target
    Advanced {
        /// The target the user should fixate next
        next_target: Point,
    },
    /// The pair was collected, the plan is exhausted, and the session has
    /// finished; the published set replaces any previous calibration
    Completed(CalibrationSet),
}

/// Stateful orchestrator for one calibration run at a time.
///
/// Bound to a fixed target plan at construction; fully reset on every
/// `start`, `finish`, or `cancel`. Invariants: `current_index` never exceeds
/// the plan length, and `collected.len() == current_index` whenever the
/// session is active.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    targets: Vec<Point>,
    collected: Vec<CalibrationPair>,
    current_index: usize,
    active: bool,
    session_id: Uuid,
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new(default_target_plan())
    }
}

impl CalibrationSession {
    /// Create an idle session bound to the given target plan
    /// (screen coordinates, presentation order).
    pub fn new(targets: Vec<Point>) -> Self {
        Self {
            targets,
            collected: Vec::new(),
            current_index: 0,
            active: false,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn targets(&self) -> &[Point] {
        &self.targets
    }

    /// Pairs collected so far, in target presentation order. Left in place
    /// after `finish` for inspection; cleared by `start` and `cancel`.
    pub fn collected(&self) -> &[CalibrationPair] {
        &self.collected
    }

    /// 0-based index of the target currently being presented
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Identifier of the current (or most recent) run
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Begin a new calibration run. Valid from any state: prior collected
    /// data never leaks into the new run. The caller must discard any
    /// previously published calibration set until this run finishes.
    pub fn start(&mut self) {
        self.collected.clear();
        self.current_index = 0;
        self.active = true;
        self.session_id = Uuid::new_v4();
        log::debug!(
            "calibration session {} started ({} targets)",
            self.session_id,
            self.targets.len()
        );
    }

    /// The target the user should currently fixate, if one is being
    /// presented. Pure query.
    pub fn current_target(&self) -> Option<Point> {
        if self.active && self.current_index < self.targets.len() {
            Some(self.targets[self.current_index])
        } else {
            None
        }
    }

    /// Pair the given sample with the current target and advance.
    ///
    /// Recording the final target finishes the session synchronously and
    /// returns the published set; there is no separate confirm step. Calling
    /// with no target being presented is a host sequencing bug: it is
    /// reported and the session is left untouched.
    pub fn record(&mut self, sample: GazeSample) -> Result<RecordOutcome, GazeError> {
        let target = match self.current_target() {
            Some(target) => target,
            None => {
                log::warn!("record called with no active calibration target");
                return Err(GazeError::NoActiveTarget);
            }
        };

        self.collected.push(CalibrationPair::new(target, sample));
        self.current_index += 1;
        log::debug!(
            "collected calibration pair {}/{}",
            self.current_index,
            self.targets.len()
        );

        match self.current_target() {
            Some(next_target) => Ok(RecordOutcome::Advanced { next_target }),
            None => {
                self.active = false;
                Ok(RecordOutcome::Completed(self.snapshot()))
            }
        }
    }

    /// Finalize the run early, publishing whatever has been collected.
    ///
    /// The collected pairs and index are left in place for inspection until
    /// the next `start`. A set shorter than the mapper's neighbor count will
    /// simply never produce an estimate.
    pub fn finish(&mut self) -> Result<CalibrationSet, GazeError> {
        if !self.active {
            return Err(GazeError::SessionInactive);
        }
        self.active = false;
        let set = self.snapshot();
        log::debug!(
            "calibration session {} finished with {} pairs",
            set.session_id,
            set.len()
        );
        Ok(set)
    }

    /// Abandon the run, discarding all collected pairs. The caller must
    /// treat its calibration set as empty afterwards (estimation disabled),
    /// which distinguishes cancellation from completion.
    pub fn cancel(&mut self) -> Result<(), GazeError> {
        if !self.active {
            return Err(GazeError::SessionInactive);
        }
        self.active = false;
        self.collected.clear();
        self.current_index = 0;
        log::debug!("calibration session {} cancelled", self.session_id);
        Ok(())
    }

    fn snapshot(&self) -> CalibrationSet {
        CalibrationSet {
            session_id: self.session_id,
            completed_at: Utc::now(),
            pairs: self.collected.clone(),
        }
    }
}
