//! Pinhole camera model with Brown-Conrady lens distortion.

use crate::constants::CAMERA_CENTER_FACTOR;
use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};

/// Lens distortion coefficients in `OpenCV` order (k1, k2, p1, p2, k3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distortion {
    /// Radial coefficient k1
    pub k1: f64,
    /// Radial coefficient k2
    pub k2: f64,
    /// Tangential coefficient p1
    pub p1: f64,
    /// Tangential coefficient p2
    pub p2: f64,
    /// Radial coefficient k3
    pub k3: f64,
}

impl Distortion {
    /// True when all coefficients are zero (ideal pinhole)
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0 && self.k3 == 0.0
    }

    /// Coefficients as a 5-element array in `OpenCV` order
    #[must_use]
    pub fn as_array(&self) -> [f64; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    /// Apply distortion to a normalized image-plane point
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_zero() {
            return (x, y);
        }
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let xd = x * radial + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * radial + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (xd, yd)
    }
}

/// Camera intrinsic parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length along x (pixels)
    pub fx: f64,
    /// Focal length along y (pixels)
    pub fy: f64,
    /// Principal point x (pixels)
    pub cx: f64,
    /// Principal point y (pixels)
    pub cy: f64,
    /// Lens distortion
    pub distortion: Distortion,
}

impl CameraIntrinsics {
    /// Create intrinsics from explicit parameters
    #[must_use]
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64, distortion: Distortion) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            distortion,
        }
    }

    /// Approximate intrinsics for a frame size: focal length equal to the
    /// frame width, principal point at the image center, no distortion.
    #[must_use]
    pub fn from_frame_size(width: u32, height: u32) -> Self {
        let focal_length = f64::from(width);
        Self::new(
            focal_length,
            focal_length,
            f64::from(width) / CAMERA_CENTER_FACTOR,
            f64::from(height) / CAMERA_CENTER_FACTOR,
            Distortion::default(),
        )
    }

    /// 3x3 camera matrix K
    #[must_use]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }

    /// Project a point given in camera coordinates to pixels.
    ///
    /// Returns `None` for points at or behind the camera plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        if point.z <= f64::EPSILON {
            return None;
        }
        let (x, y) = self.distortion.apply(point.x / point.z, point.y / point.z);
        Some(Point2::new(self.fx.mul_add(x, self.cx), self.fy.mul_add(y, self.cy)))
    }
}
