//! Stabilized head pose tracking for driving a neck joint.
//!
//! The library turns per-frame 68-point facial landmarks into smooth pitch,
//! yaw and roll angles:
//! 1. Six landmarks are matched against a fixed 3D face model
//! 2. RANSAC `PnP` (Perspective-n-Point) solves the head pose, seeded by the
//!    previous frame
//! 3. The raw pose is low-pass filtered, converted to Euler angles, passed
//!    through a deadband and a sliding-window median
//! 4. Per-axis offset and clamp shape the angles for the consumer
//!
//! Frames where the face is missing, the landmarks did not move, or the solve
//! failed produce neutral angles and leave the filter state untouched.
//!
//! # Examples
//!
//! ## Replaying recorded landmarks
//!
//! ```no_run
//! use neck_tracker::{
//!     config::Config,
//!     consumer::NeckJoint,
//!     landmarks::ReplaySource,
//!     pipeline::PosePipeline,
//!     pose_estimation::RansacPnpSolver,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut source = ReplaySource::from_file("recording.jsonl")?;
//! let solver = RansacPnpSolver::new(config.solver.ransac_params(), config.solver.seed);
//! let joint = NeckJoint::new(config.joint);
//!
//! let mut pipeline = PosePipeline::new(ReplaySource::default(), solver, joint, &config)?;
//! while let Some(frame) = source.next_frame() {
//!     let report = pipeline.process_frame(&frame)?;
//!     println!(
//!         "pitch={:.2}° yaw={:.2}° roll={:.2}° ({})",
//!         report.angles.pitch,
//!         report.angles.yaw,
//!         report.angles.roll,
//!         report.outcome().as_str()
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Stabilizing correspondences directly
//!
//! ```no_run
//! use neck_tracker::{
//!     camera::CameraIntrinsics,
//!     face_model::{select_correspondences, FaceModel3D},
//!     pose_estimation::RansacPnpSolver,
//!     stabilizer::{StabilizerParams, TemporalStabilizer},
//! };
//! use nalgebra::Point2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = FaceModel3D::default();
//! let intrinsics = CameraIntrinsics::from_frame_size(640, 480);
//! let mut stabilizer = TemporalStabilizer::new(RansacPnpSolver::default(), StabilizerParams::default());
//!
//! let landmarks: Vec<Point2<f64>> = vec![Point2::new(320.0, 240.0); 68];
//! let points = select_correspondences(&landmarks)?;
//! let frame = stabilizer.process(&points, &model, &intrinsics)?;
//! println!("{:?} {:?}", frame.outcome, frame.angles);
//! # Ok(())
//! # }
//! ```

/// Camera intrinsics and lens distortion
pub mod camera;

/// Rotation conversions and Euler angle extraction
pub mod geometry;

/// 3D face model and landmark correspondence selection
pub mod face_model;

/// Perspective pose solving with RANSAC outlier rejection
pub mod pose_estimation;

/// `OpenCV`-backed pose solver
#[cfg(feature = "opencv")]
pub mod opencv_solver;

/// Signal filtering stages for pose estimates
pub mod filters;

/// Landmark stillness detection
pub mod movement_detector;

/// Temporal stabilizer and its retained state
pub mod stabilizer;

/// Final per-axis offset and clamp
pub mod shaping;

/// Landmark and face detector boundary, replay source
pub mod landmarks;

/// Pose consumers and the neck joint
pub mod consumer;

/// Per-frame pipeline orchestration
pub mod pipeline;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
