//! Pose consumers receiving the shaped angles once per frame.

use crate::geometry::EulerAngles;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Receiver of fully shaped pitch/yaw/roll, called once per processed frame
pub trait PoseConsumer {
    fn update_pose(&mut self, pitch_deg: f64, yaw_deg: f64, roll_deg: f64);
}

impl<C: PoseConsumer + ?Sized> PoseConsumer for &mut C {
    fn update_pose(&mut self, pitch_deg: f64, yaw_deg: f64, roll_deg: f64) {
        (**self).update_pose(pitch_deg, yaw_deg, roll_deg);
    }
}

impl<C: PoseConsumer + ?Sized> PoseConsumer for Box<C> {
    fn update_pose(&mut self, pitch_deg: f64, yaw_deg: f64, roll_deg: f64) {
        (**self).update_pose(pitch_deg, yaw_deg, roll_deg);
    }
}

/// Joint orientation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointConfig {
    /// Flip the sign of pitch before applying it
    pub invert_pitch: bool,
    /// Flip the sign of yaw before applying it
    pub invert_yaw: bool,
    /// Flip the sign of roll before applying it
    pub invert_roll: bool,
    /// Rest orientation of the joint, degrees, composed in X, Y, Z order
    pub bind_pose: EulerAngles,
}

/// Rotation about local X, then local Y, then local Z
#[must_use]
pub fn compose_xyz(angles: &EulerAngles) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.pitch.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.yaw.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.roll.to_radians())
}

/// Virtual neck joint: `bind · Rx(pitch) · Ry(yaw) · Rz(roll)`
#[derive(Debug, Clone)]
pub struct NeckJoint {
    config: JointConfig,
    bind: UnitQuaternion<f64>,
    orientation: UnitQuaternion<f64>,
    last_angles: EulerAngles,
    updates: u64,
}

impl NeckJoint {
    #[must_use]
    pub fn new(config: JointConfig) -> Self {
        let bind = compose_xyz(&config.bind_pose);
        Self {
            config,
            bind,
            orientation: bind,
            last_angles: EulerAngles::NEUTRAL,
            updates: 0,
        }
    }

    /// Current joint orientation
    #[must_use]
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    /// Angles applied on the last update, after sign flips
    #[must_use]
    pub fn last_angles(&self) -> EulerAngles {
        self.last_angles
    }

    /// Number of `update_pose` calls received
    #[must_use]
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Default for NeckJoint {
    fn default() -> Self {
        Self::new(JointConfig::default())
    }
}

impl PoseConsumer for NeckJoint {
    fn update_pose(&mut self, pitch_deg: f64, yaw_deg: f64, roll_deg: f64) {
        let flip = |invert: bool, angle: f64| if invert { -angle } else { angle };
        let angles = EulerAngles::new(
            flip(self.config.invert_pitch, pitch_deg),
            flip(self.config.invert_yaw, yaw_deg),
            flip(self.config.invert_roll, roll_deg),
        );

        self.orientation = self.bind * compose_xyz(&angles);
        self.last_angles = angles;
        self.updates += 1;
    }
}
