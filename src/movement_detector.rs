//! Stillness detection on correspondence landmarks.
//!
//! Compares the current frame's correspondence points against the snapshot
//! from the last solve attempt. When every point moved less than the pixel
//! threshold, the frame carries no motion worth solving for.

use crate::face_model::Correspondences;

/// Largest Euclidean displacement between matching points
#[must_use]
pub fn max_displacement(current: &Correspondences, previous: &Correspondences) -> f64 {
    current
        .iter()
        .zip(previous)
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max)
}

/// Pixel-displacement stillness gate
#[derive(Debug, Clone, Copy)]
pub struct MovementDetector {
    threshold_px: f64,
}

impl MovementDetector {
    /// Create a new movement detector
    ///
    /// # Panics
    ///
    /// Panics if the threshold is negative
    #[must_use]
    pub fn new(threshold_px: f64) -> Self {
        assert!(threshold_px >= 0.0, "Threshold must be non-negative");
        Self { threshold_px }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold_px
    }

    /// True when no point moved at least the threshold since `previous`
    #[must_use]
    pub fn is_still(&self, current: &Correspondences, previous: &Correspondences) -> bool {
        max_displacement(current, previous) < self.threshold_px
    }
}
