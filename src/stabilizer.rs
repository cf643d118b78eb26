//! Temporal stabilization from per-frame correspondences to filtered angles.
//!
//! Per frame: stillness gate, solve, low-pass on the raw pose, Euler
//! extraction, deadband, then a sliding-window median. Frames that are still
//! or fail to solve emit [`EulerAngles::NEUTRAL`] and leave the filter state
//! as it was.

use crate::{
    camera::CameraIntrinsics,
    constants::{
        DEFAULT_DEADBAND_DEGREES, DEFAULT_LOW_PASS_ALPHA, DEFAULT_MEDIAN_WINDOW, DEFAULT_STILLNESS_THRESHOLD_PX,
    },
    face_model::{Correspondences, FaceModel3D},
    filters::{
        deadband::Deadband,
        low_pass::{PoseLowPassFilter, TrackingState},
        median::AngleHistory,
        AngleFilter,
    },
    geometry::EulerAngles,
    movement_detector::MovementDetector,
    pose_estimation::{PoseSolver, RawPose},
    Result,
};

/// Stabilizer tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerParams {
    /// Low-pass responsiveness in (0, 1]; lower is smoother
    pub alpha: f64,
    /// Axes with `|angle| < deadband` are zeroed, degrees
    pub deadband: f64,
    /// Median window length, frames
    pub median_window: usize,
    /// Maximum landmark motion treated as still, pixels
    pub stillness_threshold: f64,
}

impl Default for StabilizerParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_LOW_PASS_ALPHA,
            deadband: DEFAULT_DEADBAND_DEGREES,
            median_window: DEFAULT_MEDIAN_WINDOW,
            stillness_threshold: DEFAULT_STILLNESS_THRESHOLD_PX,
        }
    }
}

/// What happened to a frame inside the stabilizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A pose was solved and folded into the filters
    Tracked,
    /// Landmarks did not move; no update
    Still,
    /// The solver found no adequate inlier set; no update
    SolveFailed,
    /// No face in the frame; no update
    NoFace,
}

impl FrameOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracked => "tracked",
            Self::Still => "still",
            Self::SolveFailed => "solve_failed",
            Self::NoFace => "no_face",
        }
    }
}

/// Filtered angles for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizedFrame {
    pub angles: EulerAngles,
    pub outcome: FrameOutcome,
}

impl StabilizedFrame {
    #[must_use]
    pub fn neutral(outcome: FrameOutcome) -> Self {
        Self {
            angles: EulerAngles::NEUTRAL,
            outcome,
        }
    }
}

/// State retained between frames
#[derive(Debug, Clone)]
pub struct StabilizerState {
    pose_filter: PoseLowPassFilter,
    snapshot: Option<Correspondences>,
    history: AngleHistory,
}

impl StabilizerState {
    /// Empty state in `NoPriorPose`
    ///
    /// # Panics
    ///
    /// Panics if alpha is outside (0, 1] or the median window is zero
    #[must_use]
    pub fn new(params: &StabilizerParams) -> Self {
        Self {
            pose_filter: PoseLowPassFilter::new(params.alpha),
            snapshot: None,
            history: AngleHistory::new(params.median_window),
        }
    }

    /// State already tracking `pose`, with `snapshot` as the last landmarks
    ///
    /// # Panics
    ///
    /// Panics if alpha is outside (0, 1] or the median window is zero
    #[must_use]
    pub fn tracking(params: &StabilizerParams, pose: RawPose, snapshot: Correspondences) -> Self {
        Self {
            pose_filter: PoseLowPassFilter::with_state(params.alpha, TrackingState::Tracking(pose)),
            snapshot: Some(snapshot),
            history: AngleHistory::new(params.median_window),
        }
    }

    #[must_use]
    pub fn tracking_state(&self) -> &TrackingState {
        self.pose_filter.state()
    }

    /// Filtered raw pose, `None` before the first successful solve
    #[must_use]
    pub fn raw_pose(&self) -> Option<&RawPose> {
        self.pose_filter.state().pose()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Correspondences> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &AngleHistory {
        &self.history
    }
}

/// Temporal stabilizer owning its solver and retained state
pub struct TemporalStabilizer<S: PoseSolver> {
    solver: S,
    params: StabilizerParams,
    stillness: MovementDetector,
    deadband: Deadband,
    state: StabilizerState,
}

impl<S: PoseSolver> TemporalStabilizer<S> {
    /// Create a stabilizer in `NoPriorPose`
    ///
    /// # Panics
    ///
    /// Panics on out-of-range parameters; validate them through
    /// [`crate::config::Config::validate`] first.
    #[must_use]
    pub fn new(solver: S, params: StabilizerParams) -> Self {
        let state = StabilizerState::new(&params);
        Self::with_state(solver, params, state)
    }

    /// Create a stabilizer resuming from an explicit state
    ///
    /// # Panics
    ///
    /// Panics on a negative deadband or stillness threshold
    #[must_use]
    pub fn with_state(solver: S, params: StabilizerParams, state: StabilizerState) -> Self {
        log::info!(
            "Initializing TemporalStabilizer with {}: alpha={}, deadband={}°, median_window={}, stillness={}px",
            solver.name(),
            params.alpha,
            params.deadband,
            params.median_window,
            params.stillness_threshold
        );
        Self {
            solver,
            stillness: MovementDetector::new(params.stillness_threshold),
            deadband: Deadband::new(params.deadband),
            params,
            state,
        }
    }

    /// Stabilize one frame of correspondences.
    ///
    /// # Errors
    ///
    /// Propagates solver errors for malformed input; still frames and solve
    /// failures are reported through [`FrameOutcome`] instead.
    pub fn process(
        &mut self,
        points: &Correspondences,
        model: &FaceModel3D,
        intrinsics: &CameraIntrinsics,
    ) -> Result<StabilizedFrame> {
        if let (true, Some(previous)) = (self.state.pose_filter.state().is_tracking(), &self.state.snapshot) {
            if self.stillness.is_still(points, previous) {
                log::debug!("Landmarks still, skipping solve");
                return Ok(StabilizedFrame::neutral(FrameOutcome::Still));
            }
        }

        let seed = self.state.pose_filter.state().pose().copied();
        let solution = self.solver.solve(model, points, intrinsics, seed.as_ref())?;
        self.state.snapshot = Some(*points);

        let Some(solution) = solution else {
            log::warn!("Pose solve failed, emitting neutral angles");
            return Ok(StabilizedFrame::neutral(FrameOutcome::SolveFailed));
        };

        let filtered = self.state.pose_filter.apply(&solution.pose);
        let angles = self.deadband.apply(filtered.euler());
        let angles = self.state.history.apply(angles);

        log::debug!(
            "Stabilized pose: pitch={:.2}° yaw={:.2}° roll={:.2}°",
            angles.pitch,
            angles.yaw,
            angles.roll
        );
        Ok(StabilizedFrame {
            angles,
            outcome: FrameOutcome::Tracked,
        })
    }

    #[must_use]
    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    #[must_use]
    pub fn params(&self) -> &StabilizerParams {
        &self.params
    }

    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Drop all retained state and return to `NoPriorPose`
    pub fn reset(&mut self) {
        self.state = StabilizerState::new(&self.params);
    }
}
