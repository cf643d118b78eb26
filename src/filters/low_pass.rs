use crate::pose_estimation::RawPose;

/// First-order low-pass blend, component-wise on both vectors:
/// `previous·(1−α) + solved·α`
#[must_use]
pub fn blend(previous: &RawPose, solved: &RawPose, alpha: f64) -> RawPose {
    RawPose::new(
        previous.rotation.zip_map(&solved.rotation, |last, new| alpha.mul_add(new - last, last)),
        previous.translation.zip_map(&solved.translation, |last, new| alpha.mul_add(new - last, last)),
    )
}

/// Whether the low-pass holds a meaningful previous estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrackingState {
    /// No successful solve yet
    #[default]
    NoPriorPose,
    /// Filtered pose after at least one successful solve
    Tracking(RawPose),
}

impl TrackingState {
    /// Fold a solved pose into the filter and return the filtered pose.
    ///
    /// The first solve is taken as-is; every later one is blended.
    pub fn update(&mut self, solved: &RawPose, alpha: f64) -> RawPose {
        let filtered = match self {
            Self::NoPriorPose => *solved,
            Self::Tracking(previous) => blend(previous, solved, alpha),
        };
        *self = Self::Tracking(filtered);
        filtered
    }

    /// Filtered pose, if tracking
    #[must_use]
    pub fn pose(&self) -> Option<&RawPose> {
        match self {
            Self::NoPriorPose => None,
            Self::Tracking(pose) => Some(pose),
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking(_))
    }
}

/// Low-pass filter on the raw pose
#[derive(Debug, Clone)]
pub struct PoseLowPassFilter {
    alpha: f64,
    state: TrackingState,
}

impl PoseLowPassFilter {
    /// Create a new pose low-pass filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            state: TrackingState::NoPriorPose,
        }
    }

    /// Restore a filter around an existing state
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn with_state(alpha: f64, state: TrackingState) -> Self {
        let mut filter = Self::new(alpha);
        filter.state = state;
        filter
    }

    pub fn apply(&mut self, solved: &RawPose) -> RawPose {
        self.state.update(solved, self.alpha)
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = TrackingState::NoPriorPose;
    }
}
