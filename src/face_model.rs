//! Generic 3-D face model and landmark correspondence selection.

use crate::{
    constants::{CORRESPONDENCE_INDICES, MIN_LANDMARKS, NUM_CORRESPONDENCES},
    Error, Result,
};
use nalgebra::{Point2, Point3};
use std::fs;
use std::path::Path;

/// Correspondence points selected from one landmark array
pub type Correspondences = [Point2<f64>; NUM_CORRESPONDENCES];

/// Six reference points of an average head, in millimeter-like units.
///
/// Order: nose tip, chin, left eye outer corner, right eye outer corner,
/// left mouth corner, right mouth corner. +Y is up and +Z points out of the
/// face, see [`crate::geometry`] for how this pairs with the camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceModel3D {
    points: [Point3<f64>; NUM_CORRESPONDENCES],
}

impl Default for FaceModel3D {
    fn default() -> Self {
        Self {
            points: [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, -330.0, -65.0),
                Point3::new(-225.0, 170.0, -135.0),
                Point3::new(225.0, 170.0, -135.0),
                Point3::new(-150.0, -150.0, -125.0),
                Point3::new(150.0, -150.0, -125.0),
            ],
        }
    }
}

impl FaceModel3D {
    #[must_use]
    pub fn new(points: [Point3<f64>; NUM_CORRESPONDENCES]) -> Self {
        Self { points }
    }

    /// Load a model from a text file holding 18 coordinates, one per line
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold exactly
    /// six points.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading face model from: {}", path.as_ref().display());
        let content = fs::read_to_string(path)?;
        Self::parse_model_points(&content)
    }

    fn parse_model_points(content: &str) -> Result<Self> {
        let values = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                line.parse::<f64>()
                    .map_err(|e| Error::InvalidInput(format!("Invalid model coordinate '{line}': {e}")))
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() != NUM_CORRESPONDENCES * 3 {
            return Err(Error::InvalidInput(format!(
                "Expected {} coordinate values ({} points × 3), got {}",
                NUM_CORRESPONDENCES * 3,
                NUM_CORRESPONDENCES,
                values.len()
            )));
        }

        let mut points = [Point3::origin(); NUM_CORRESPONDENCES];
        for (point, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Point3::new(xyz[0], xyz[1], xyz[2]);
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn points(&self) -> &[Point3<f64>; NUM_CORRESPONDENCES] {
        &self.points
    }
}

/// Pick the six correspondence landmarks in model order.
///
/// # Errors
///
/// Returns [`Error::DegenerateInput`] if the array is too short to contain
/// index 54.
pub fn select_correspondences(landmarks: &[Point2<f64>]) -> Result<Correspondences> {
    if landmarks.len() < MIN_LANDMARKS {
        return Err(Error::DegenerateInput(format!(
            "Expected at least {} landmarks, got {}",
            MIN_LANDMARKS,
            landmarks.len()
        )));
    }
    Ok(CORRESPONDENCE_INDICES.map(|index| landmarks[index]))
}
