//! Configuration file loading, saving and validation

use neck_tracker::{
    config::{Config, EXAMPLE_CONFIG},
    shaping::AxisShaping,
    Error,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_file_round_trip() {
    let mut config = Config::default();
    config.camera.frame_width = 1280;
    config.camera.frame_height = 720;
    config.camera.focal_length = Some(1100.0);
    config.solver.seed = 42;
    config.stabilizer.alpha = 0.35;
    config.shaping.yaw = AxisShaping::clamped(2.0, -45.0, 45.0);
    config.joint.invert_roll = true;

    let file = NamedTempFile::new().unwrap();
    config.to_file(file.path()).unwrap();
    let loaded = Config::from_file(file.path()).unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_example_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE_CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.stabilizer.median_window, 15);
    assert_eq!(config.solver.reprojection_error, 4.0);
    assert_eq!(config.camera.intrinsics().cx, 320.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Config::from_file("/nonexistent/neck-tracker.yaml");
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"stabilizer: [not, a, mapping]\n").unwrap();

    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_face_model_path_is_loaded() {
    let mut model = NamedTempFile::new().unwrap();
    writeln!(model, "# nose, chin, eyes, mouth").unwrap();
    for value in [
        0.0, 0.0, 0.0, 0.0, -300.0, -60.0, -200.0, 160.0, -130.0, 200.0, 160.0, -130.0, -140.0, -140.0, -120.0, 140.0,
        -140.0, -120.0,
    ] {
        writeln!(model, "{value}").unwrap();
    }

    let mut config = Config::default();
    config.model.face_model_3d = Some(model.path().to_path_buf());
    assert!(config.validate().is_ok());

    let loaded = config.face_model().unwrap();
    assert_eq!(loaded.points()[1].y, -300.0);
    assert_eq!(loaded.points()[5].x, 140.0);
}

#[test]
fn test_validation_messages() {
    let mut config = Config::default();
    config.stabilizer.alpha = 1.5;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("alpha"), "{err}");

    let mut config = Config::default();
    config.camera.frame_width = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Frame size"), "{err}");

    let mut config = Config::default();
    config.shaping.roll = AxisShaping::clamped(0.0, 1.0, -1.0);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("roll"), "{err}");

    // Inverted bounds are ignored while the clamp is disabled
    config.shaping.roll.clamp_enabled = false;
    assert!(config.validate().is_ok());
}
