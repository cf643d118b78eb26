//! Constants used throughout the tracker

/// Number of facial landmarks produced by the 68-point landmark model
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Number of landmark/model correspondences used for pose solving
pub const NUM_CORRESPONDENCES: usize = 6;

/// Landmark indices in the 68-point numbering (iBUG 300-W layout).
///
/// 30 is the nose tip, 8 the chin, 36 and 45 the outer eye corners and
/// 48 and 54 the mouth corners.
pub const NOSE_TIP_INDEX: usize = 30;
pub const CHIN_INDEX: usize = 8;
pub const LEFT_EYE_OUTER_INDEX: usize = 36;
pub const RIGHT_EYE_OUTER_INDEX: usize = 45;
pub const LEFT_MOUTH_CORNER_INDEX: usize = 48;
pub const RIGHT_MOUTH_CORNER_INDEX: usize = 54;

/// Correspondence order, matched positionally with [`crate::face_model::FaceModel3D`]
pub const CORRESPONDENCE_INDICES: [usize; NUM_CORRESPONDENCES] = [
    NOSE_TIP_INDEX,
    CHIN_INDEX,
    LEFT_EYE_OUTER_INDEX,
    RIGHT_EYE_OUTER_INDEX,
    LEFT_MOUTH_CORNER_INDEX,
    RIGHT_MOUTH_CORNER_INDEX,
];

/// Smallest landmark array that contains every correspondence index
pub const MIN_LANDMARKS: usize = RIGHT_MOUTH_CORNER_INDEX + 1;

/// Camera matrix center factor
pub const CAMERA_CENTER_FACTOR: f64 = 2.0;

/// Default frame size used when no configuration is given
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Default RANSAC parameters
pub const DEFAULT_RANSAC_ITERATIONS: usize = 100;
pub const DEFAULT_REPROJECTION_ERROR: f64 = 4.0;
pub const DEFAULT_RANSAC_CONFIDENCE: f64 = 0.99;
pub const DEFAULT_MIN_INLIERS: usize = 4;
pub const DEFAULT_REFINE_ITERATIONS: usize = 20;
pub const DEFAULT_RANSAC_SEED: u64 = 0x5EED;

/// Correspondences drawn per RANSAC hypothesis
pub const MINIMAL_SAMPLE_SIZE: usize = 4;

/// Default stabilizer parameters
pub const DEFAULT_LOW_PASS_ALPHA: f64 = 0.2;
pub const DEFAULT_DEADBAND_DEGREES: f64 = 0.4;
pub const DEFAULT_MEDIAN_WINDOW: usize = 15;
pub const DEFAULT_STILLNESS_THRESHOLD_PX: f64 = 1.0;

/// Low-pass alpha bounds
pub const LOW_PASS_ALPHA_MIN: f64 = 0.0;
pub const LOW_PASS_ALPHA_MAX: f64 = 1.0;
