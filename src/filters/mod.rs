//! Signal filtering stages of the temporal stabilizer.
//!
//! The pose-domain low-pass runs on raw rotation/translation vectors; the
//! deadband and median stages run on Euler angles and share [`AngleFilter`].

/// Recursive low-pass on the raw pose with explicit first-solve seeding
pub mod low_pass;

/// Sliding-window median over per-axis circular buffers
pub mod median;

/// Deadband that zeroes micro-jitter
pub mod deadband;

use crate::geometry::EulerAngles;

/// Trait for filters operating on pitch/yaw/roll
pub trait AngleFilter: Send + Sync {
    /// Apply filter to input angles
    fn apply(&mut self, angles: EulerAngles) -> EulerAngles;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}
