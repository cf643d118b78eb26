use super::AngleFilter;
use crate::geometry::EulerAngles;

/// Forces an axis to exactly zero while `|angle| < threshold`
#[derive(Debug, Clone, Copy)]
pub struct Deadband {
    threshold: f64,
}

impl Deadband {
    /// # Panics
    ///
    /// Panics if threshold is negative
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        assert!(threshold >= 0.0, "Threshold must be non-negative");
        Self { threshold }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn suppress(&self, angle: f64) -> f64 {
        if angle.abs() < self.threshold {
            0.0
        } else {
            angle
        }
    }
}

impl AngleFilter for Deadband {
    fn apply(&mut self, angles: EulerAngles) -> EulerAngles {
        angles.map(|angle| self.suppress(angle))
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "Deadband"
    }
}
