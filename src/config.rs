//! Configuration management for the neck tracker

use crate::{
    camera::{CameraIntrinsics, Distortion},
    constants::{
        DEFAULT_DEADBAND_DEGREES, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_LOW_PASS_ALPHA,
        DEFAULT_MEDIAN_WINDOW, DEFAULT_MIN_INLIERS, DEFAULT_RANSAC_CONFIDENCE, DEFAULT_RANSAC_ITERATIONS,
        DEFAULT_RANSAC_SEED, DEFAULT_REFINE_ITERATIONS, DEFAULT_REPROJECTION_ERROR, DEFAULT_STILLNESS_THRESHOLD_PX,
        LOW_PASS_ALPHA_MAX, LOW_PASS_ALPHA_MIN, MINIMAL_SAMPLE_SIZE, NUM_CORRESPONDENCES,
    },
    consumer::JointConfig,
    face_model::FaceModel3D,
    pose_estimation::RansacParams,
    shaping::{AxisShaping, ShapingConfig},
    stabilizer::StabilizerParams,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Face model configuration
    pub model: ModelConfig,

    /// Pose solver configuration
    pub solver: SolverConfig,

    /// Temporal stabilizer configuration
    pub stabilizer: StabilizerConfig,

    /// Output shaping per axis
    pub shaping: ShapingConfig,

    /// Neck joint configuration
    pub joint: JointConfig,
}

/// Camera parameters, derived from the expected frame size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Frame width in pixels
    pub frame_width: u32,

    /// Frame height in pixels
    pub frame_height: u32,

    /// Focal length override in pixels (defaults to the frame width)
    pub focal_length: Option<f64>,

    /// Lens distortion coefficients
    pub distortion: Distortion,
}

/// Face model source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to a six-point model file; the built-in model is used when unset
    pub face_model_3d: Option<PathBuf>,
}

/// RANSAC pose solver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum RANSAC iterations
    pub max_iterations: usize,

    /// Inlier reprojection threshold in pixels
    pub reprojection_error: f64,

    /// Target confidence (0.0-1.0, exclusive)
    pub confidence: f64,

    /// Minimum inliers for a successful solve
    pub min_inliers: usize,

    /// Levenberg-Marquardt iterations per fit
    pub refine_iterations: usize,

    /// Random seed for sample selection
    pub seed: u64,
}

/// Temporal stabilizer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Low-pass alpha (0.0 exclusive to 1.0)
    pub alpha: f64,

    /// Deadband threshold in degrees
    pub deadband: f64,

    /// Median filter window size
    pub median_window: usize,

    /// Stillness threshold in pixels
    pub stillness_threshold: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            focal_length: None,
            distortion: Distortion::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_RANSAC_ITERATIONS,
            reprojection_error: DEFAULT_REPROJECTION_ERROR,
            confidence: DEFAULT_RANSAC_CONFIDENCE,
            min_inliers: DEFAULT_MIN_INLIERS,
            refine_iterations: DEFAULT_REFINE_ITERATIONS,
            seed: DEFAULT_RANSAC_SEED,
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_LOW_PASS_ALPHA,
            deadband: DEFAULT_DEADBAND_DEGREES,
            median_window: DEFAULT_MEDIAN_WINDOW,
            stillness_threshold: DEFAULT_STILLNESS_THRESHOLD_PX,
        }
    }
}

impl CameraConfig {
    /// Camera intrinsics for the configured frame
    #[must_use]
    pub fn intrinsics(&self) -> CameraIntrinsics {
        let mut intrinsics = CameraIntrinsics::from_frame_size(self.frame_width, self.frame_height);
        if let Some(focal_length) = self.focal_length {
            intrinsics.fx = focal_length;
            intrinsics.fy = focal_length;
        }
        intrinsics.distortion = self.distortion;
        intrinsics
    }
}

impl SolverConfig {
    #[must_use]
    pub fn ransac_params(&self) -> RansacParams {
        RansacParams {
            max_iterations: self.max_iterations,
            reprojection_error: self.reprojection_error,
            confidence: self.confidence,
            min_inliers: self.min_inliers,
            refine_iterations: self.refine_iterations,
        }
    }
}

impl StabilizerConfig {
    #[must_use]
    pub fn params(&self) -> StabilizerParams {
        StabilizerParams {
            alpha: self.alpha,
            deadband: self.deadband,
            median_window: self.median_window,
            stillness_threshold: self.stillness_threshold,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Load the configured face model, or the built-in one
    ///
    /// # Errors
    ///
    /// Returns an error if a configured model file cannot be loaded
    pub fn face_model(&self) -> Result<FaceModel3D> {
        match &self.model.face_model_3d {
            Some(path) => FaceModel3D::from_file(path),
            None => Ok(FaceModel3D::default()),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a [`Error::ConfigError`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        // Validate camera
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            return Err(Error::ConfigError("Frame size must be greater than 0".to_string()));
        }
        if let Some(focal_length) = self.camera.focal_length {
            if !(focal_length.is_finite() && focal_length > 0.0) {
                return Err(Error::ConfigError("Focal length must be positive".to_string()));
            }
        }

        // Validate solver parameters
        if self.solver.max_iterations == 0 {
            return Err(Error::ConfigError(
                "RANSAC iterations must be greater than 0".to_string(),
            ));
        }
        if !(self.solver.reprojection_error > 0.0) {
            return Err(Error::ConfigError(
                "Reprojection error threshold must be positive".to_string(),
            ));
        }
        if !(self.solver.confidence > 0.0 && self.solver.confidence < 1.0) {
            return Err(Error::ConfigError(
                "Confidence must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        if !(MINIMAL_SAMPLE_SIZE..=NUM_CORRESPONDENCES).contains(&self.solver.min_inliers) {
            return Err(Error::ConfigError(format!(
                "Minimum inliers must be between {MINIMAL_SAMPLE_SIZE} and {NUM_CORRESPONDENCES}"
            )));
        }

        // Validate stabilizer parameters
        if !(self.stabilizer.alpha > LOW_PASS_ALPHA_MIN && self.stabilizer.alpha <= LOW_PASS_ALPHA_MAX) {
            return Err(Error::ConfigError(
                "Low-pass alpha must be in (0.0, 1.0]".to_string(),
            ));
        }
        if !(self.stabilizer.deadband >= 0.0) {
            return Err(Error::ConfigError("Deadband must be non-negative".to_string()));
        }
        if self.stabilizer.median_window == 0 {
            return Err(Error::ConfigError(
                "Median window size must be greater than 0".to_string(),
            ));
        }
        if !(self.stabilizer.stillness_threshold >= 0.0) {
            return Err(Error::ConfigError(
                "Stillness threshold must be non-negative".to_string(),
            ));
        }

        // Validate shaping ranges
        for (name, axis) in [
            ("pitch", &self.shaping.pitch),
            ("yaw", &self.shaping.yaw),
            ("roll", &self.shaping.roll),
        ] {
            validate_axis(name, axis)?;
        }

        // Validate model path exists
        if let Some(path) = &self.model.face_model_3d {
            if !path.exists() {
                return Err(Error::ConfigError(format!(
                    "3D face model not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

fn validate_axis(name: &str, axis: &AxisShaping) -> Result<()> {
    if !axis.offset.is_finite() {
        return Err(Error::ConfigError(format!("{name} offset must be finite")));
    }
    if axis.clamp_enabled && !(axis.min <= axis.max) {
        return Err(Error::ConfigError(format!(
            "{name} clamp range must satisfy min <= max, got [{}, {}]",
            axis.min, axis.max
        )));
    }
    Ok(())
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Neck Tracker Configuration

# Camera, derived from the expected frame size
camera:
  frame_width: 640
  frame_height: 480
  # focal_length: 640.0
  distortion:
    k1: 0.0
    k2: 0.0
    p1: 0.0
    p2: 0.0
    k3: 0.0

# Face model (built-in six-point model when unset)
model:
  face_model_3d: null  # or a path to a six-point model file

# RANSAC pose solver
solver:
  max_iterations: 100
  reprojection_error: 4.0
  confidence: 0.99
  min_inliers: 4
  refine_iterations: 20
  seed: 24301

# Temporal stabilizer
stabilizer:
  alpha: 0.2
  deadband: 0.4
  median_window: 15
  stillness_threshold: 1.0

# Output shaping (degrees)
shaping:
  pitch:
    offset: 0.0
    clamp_enabled: true
    min: -30.0
    max: 30.0
  yaw:
    offset: 0.0
    clamp_enabled: true
    min: -60.0
    max: 60.0
  roll:
    offset: 0.0
    clamp_enabled: false

# Neck joint
joint:
  invert_pitch: false
  invert_yaw: true
  invert_roll: false
  bind_pose:
    pitch: 0.0
    yaw: 0.0
    roll: 0.0
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stabilizer.median_window, 15);
        assert_eq!(config.solver.max_iterations, 100);
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.solver.seed, DEFAULT_RANSAC_SEED);
        assert!(config.shaping.yaw.clamp_enabled);
        assert_eq!(config.shaping.yaw.max, 60.0);
        assert!(!config.shaping.roll.clamp_enabled);
        assert!(config.joint.invert_yaw);
        assert!(config.model.face_model_3d.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("stabilizer:\n  alpha: 0.5\n").unwrap();
        assert_eq!(config.stabilizer.alpha, 0.5);
        assert_eq!(config.stabilizer.deadband, DEFAULT_DEADBAND_DEGREES);
        assert_eq!(config.camera.frame_width, DEFAULT_FRAME_WIDTH);
    }

    #[test]
    fn test_intrinsics_focal_override() {
        let mut camera = CameraConfig::default();
        assert_eq!(camera.intrinsics().fx, 640.0);
        camera.focal_length = Some(800.0);
        let intrinsics = camera.intrinsics();
        assert_eq!((intrinsics.fx, intrinsics.fy), (800.0, 800.0));
        assert_eq!(intrinsics.cx, 320.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.stabilizer.alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stabilizer.median_window = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.solver.confidence = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.solver.min_inliers = 7;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.shaping.pitch = AxisShaping::clamped(0.0, 10.0, -10.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.stabilizer.deadband = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.face_model_3d = Some(PathBuf::from("/nonexistent/model.txt"));
        assert!(config.validate().is_err());
    }
}
