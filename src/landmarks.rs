//! Landmark source boundary: detector traits, face rectangles, and a replay
//! source for recorded landmark streams.

use crate::{Error, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Axis-aligned face rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle containing all points, `None` for an empty slice
    #[must_use]
    pub fn bounding(points: &[Point2<f64>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Expand by `shift` of the size on each side, make square, and keep it
    /// inside a `max_width` × `max_height` frame.
    ///
    /// Coarse detectors return tight boxes; landmark models expect some margin.
    #[must_use]
    pub fn refined(&self, max_width: f64, max_height: f64, shift: f64) -> Self {
        let x_shift = (self.width * shift).clamp(0.0, max_width);
        let y_shift = (self.height * shift).clamp(0.0, max_height);

        let x = (self.x - x_shift).max(0.0);
        let y = (self.y - y_shift).max(0.0);
        let width = (self.width + 2.0 * x_shift).min(max_width - x);
        let height = (self.height + 2.0 * y_shift).min(max_height - y);

        let side = width.max(height).min(max_width.min(max_height));
        Self::new(
            x.min(max_width - side).max(0.0),
            y.min(max_height - side).max(0.0),
            side,
            side,
        )
    }
}

/// Primary detector: face rectangles plus ordered 68-point landmarks
pub trait LandmarkDetector {
    type Image;

    /// Faces found by the landmark model's own face finder
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying detector fails
    fn detect_faces(&mut self, image: &Self::Image) -> Result<Vec<Rect>>;

    /// Ordered landmarks inside `region`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying detector fails
    fn detect_landmarks(&mut self, image: &Self::Image, region: Rect) -> Result<Vec<Point2<f64>>>;
}

/// Coarse face detector consulted only when the primary one finds nothing
pub trait FaceDetector {
    type Image;

    /// # Errors
    ///
    /// Returns an error if the underlying detector fails
    fn detect_face(&mut self, image: &Self::Image) -> Result<Option<Rect>>;
}

/// One recorded frame of landmark output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Ordered landmarks, empty when no face was found
    #[serde(default)]
    pub landmarks: Vec<[f64; 2]>,
    /// Detector rectangle, if recorded
    #[serde(default)]
    pub face: Option<Rect>,
}

impl LandmarkFrame {
    #[must_use]
    pub fn points(&self) -> Vec<Point2<f64>> {
        self.landmarks.iter().map(|&[x, y]| Point2::new(x, y)).collect()
    }
}

/// Parse a JSON-lines landmark recording, skipping blank lines
///
/// # Errors
///
/// Returns [`Error::Replay`] naming the first malformed line
pub fn parse_replay(content: &str) -> Result<Vec<LandmarkFrame>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| Error::Replay(format!("line {}: {e}", number + 1)))
        })
        .collect()
}

/// Landmark source that plays back a recording
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<LandmarkFrame>,
}

impl ReplaySource {
    #[must_use]
    pub fn new(frames: Vec<LandmarkFrame>) -> Self {
        Self { frames: frames.into() }
    }

    /// Load a JSON-lines recording
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading landmark recording: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        let frames = parse_replay(&content)?;
        log::info!("Loaded {} frames", frames.len());
        Ok(Self::new(frames))
    }

    /// Next recorded frame, `None` at the end of the recording
    pub fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.frames.pop_front()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkDetector for ReplaySource {
    type Image = LandmarkFrame;

    fn detect_faces(&mut self, image: &LandmarkFrame) -> Result<Vec<Rect>> {
        if let Some(face) = image.face {
            if !(face.width > 0.0 && face.height > 0.0 && face.x.is_finite() && face.y.is_finite()) {
                return Err(Error::LandmarkSource(format!("recorded face rectangle is degenerate: {face:?}")));
            }
        }
        Ok(image.face.or_else(|| Rect::bounding(&image.points())).into_iter().collect())
    }

    fn detect_landmarks(&mut self, image: &LandmarkFrame, _region: Rect) -> Result<Vec<Point2<f64>>> {
        Ok(image.points())
    }
}
