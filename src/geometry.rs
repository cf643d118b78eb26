//! Rotation conversions and the pose-to-Euler convention.
//!
//! Camera frame: +X right, +Y down (so up is −Y), +Z forward out of the lens.
//! The face model ([`crate::face_model::FaceModel3D`]) uses +Y up and +Z out
//! of the face, so a subject looking straight into the camera has the
//! rotation `diag(1, −1, −1)` (π about X). The extraction formulas in
//! [`rotation_matrix_to_euler`] are written against that pairing and yield
//! zero for the frontal pose:
//!
//! - yaw is positive for a rotation about the model's up axis (+Y)
//! - pitch is positive for a rotation about the model's −X axis
//! - roll is positive for a rotation about the model's −Z axis
//!
//! Keep any change to the model frame and these formulas together.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Pitch, yaw and roll in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EulerAngles {
    /// Rotation about the horizontal axis (nodding)
    pub pitch: f64,
    /// Rotation about the vertical axis (shaking)
    pub yaw: f64,
    /// Rotation about the viewing axis (tilting)
    pub roll: f64,
}

impl EulerAngles {
    /// All-zero output emitted on frames without an update
    pub const NEUTRAL: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Angles as `[pitch, yaw, roll]`
    #[must_use]
    pub fn as_array(&self) -> [f64; 3] {
        [self.pitch, self.yaw, self.roll]
    }

    #[must_use]
    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Apply `f` to each axis
    #[must_use]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self::new(f(self.pitch), f(self.yaw), f(self.roll))
    }
}

/// Axis-angle exponential map (Rodrigues)
#[must_use]
pub fn rotation_vector_to_matrix(rotation: &Vector3<f64>) -> Matrix3<f64> {
    Rotation3::new(*rotation).into_inner()
}

/// Logarithm of a rotation matrix; the angle of the result lies in [0, π]
///
/// Goes through the quaternion: the axis read off a matrix is unstable at
/// exactly π, which is where every pure-yaw pose of the face model sits.
#[must_use]
pub fn matrix_to_rotation_vector(matrix: &Matrix3<f64>) -> Vector3<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*matrix)).scaled_axis()
}

/// Re-express `rotation` as the equivalent axis-angle vector nearest `reference`.
///
/// `a·θ` and `a·(θ − 2π)` describe the same rotation. Near θ = π the
/// logarithm may flip between them from one frame to the next, which would
/// make a component-wise blend meaningless.
#[must_use]
pub fn closest_equivalent_rotation_vector(rotation: &Vector3<f64>, reference: &Vector3<f64>) -> Vector3<f64> {
    let angle = rotation.norm();
    if angle < f64::EPSILON {
        return *rotation;
    }
    let axis = rotation / angle;
    (-2..=2)
        .map(|turns| axis * (angle + 2.0 * PI * f64::from(turns)))
        .min_by(|a, b| (a - reference).norm().total_cmp(&(b - reference).norm()))
        .unwrap_or(*rotation)
}

/// Convert rotation matrix to Euler angles in degrees
///
/// pitch = asin(−R₁₂), yaw = atan2(R₀₂, −R₂₂), roll = atan2(R₁₀, R₀₀).
/// The asin argument is clamped to [−1, 1] against floating-point drift.
#[must_use]
pub fn rotation_matrix_to_euler(rotation: &Matrix3<f64>) -> EulerAngles {
    let pitch = (-rotation[(1, 2)]).clamp(-1.0, 1.0).asin();
    let yaw = rotation[(0, 2)].atan2(-rotation[(2, 2)]);
    let roll = rotation[(1, 0)].atan2(rotation[(0, 0)]);

    EulerAngles::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Pose-to-Euler: rotation vector → rotation matrix → pitch/yaw/roll degrees
#[must_use]
pub fn pose_to_euler(rotation: &Vector3<f64>) -> EulerAngles {
    rotation_matrix_to_euler(&rotation_vector_to_matrix(rotation))
}

/// Rotation vector of a face looking straight into the camera
#[must_use]
pub fn frontal_rotation_vector() -> Vector3<f64> {
    Vector3::new(PI, 0.0, 0.0)
}
