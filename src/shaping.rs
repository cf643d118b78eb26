//! Final per-axis offset and clamp before angles reach the consumer.

use crate::geometry::EulerAngles;
use serde::{Deserialize, Serialize};

/// Offset and optional clamp range for one axis, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisShaping {
    /// Added to the filtered angle
    pub offset: f64,
    /// Clamp the offset angle to `[min, max]`
    pub clamp_enabled: bool,
    /// Lower clamp bound
    pub min: f64,
    /// Upper clamp bound
    pub max: f64,
}

impl Default for AxisShaping {
    fn default() -> Self {
        Self {
            offset: 0.0,
            clamp_enabled: false,
            min: -90.0,
            max: 90.0,
        }
    }
}

impl AxisShaping {
    /// Clamp enabled over `[min, max]` with the given offset
    #[must_use]
    pub fn clamped(offset: f64, min: f64, max: f64) -> Self {
        Self {
            offset,
            clamp_enabled: true,
            min,
            max,
        }
    }

    /// Offset first, then clamp when enabled
    #[must_use]
    pub fn shape(&self, angle: f64) -> f64 {
        let shifted = angle + self.offset;
        if self.clamp_enabled {
            shifted.clamp(self.min, self.max)
        } else {
            shifted
        }
    }
}

/// Shaping configuration for all three axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    pub pitch: AxisShaping,
    pub yaw: AxisShaping,
    pub roll: AxisShaping,
}

/// Applies [`ShapingConfig`] to every frame, neutral frames included
#[derive(Debug, Clone, Copy)]
pub struct AngleShaper {
    config: ShapingConfig,
}

impl AngleShaper {
    /// # Panics
    ///
    /// Panics if an enabled clamp range has `min > max`
    #[must_use]
    pub fn new(config: ShapingConfig) -> Self {
        for axis in [&config.pitch, &config.yaw, &config.roll] {
            assert!(!axis.clamp_enabled || axis.min <= axis.max, "Clamp range must satisfy min <= max");
        }
        Self { config }
    }

    #[must_use]
    pub fn shape(&self, angles: EulerAngles) -> EulerAngles {
        EulerAngles::new(
            self.config.pitch.shape(angles.pitch),
            self.config.yaw.shape(angles.yaw),
            self.config.roll.shape(angles.roll),
        )
    }

    #[must_use]
    pub fn config(&self) -> &ShapingConfig {
        &self.config
    }
}
