//! Per-frame orchestration: detect, select, stabilize, shape, hand off.

use crate::{
    camera::CameraIntrinsics,
    config::Config,
    consumer::PoseConsumer,
    face_model::{select_correspondences, FaceModel3D},
    geometry::EulerAngles,
    landmarks::{FaceDetector, LandmarkDetector, Rect},
    pose_estimation::PoseSolver,
    shaping::AngleShaper,
    stabilizer::{FrameOutcome, StabilizedFrame, TemporalStabilizer},
    Result,
};
use log::{debug, info, warn};

/// Margin added around fallback detector boxes before landmark detection
const FALLBACK_BOX_SHIFT: f64 = 0.2;

/// Result of one processed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based frame index
    pub frame: u64,
    /// Angles handed to the consumer
    pub angles: EulerAngles,
    /// Stabilizer output before shaping
    pub stabilized: StabilizedFrame,
}

impl FrameReport {
    #[must_use]
    pub fn outcome(&self) -> FrameOutcome {
        self.stabilized.outcome
    }
}

/// Complete pose pipeline for one landmark source and one consumer
pub struct PosePipeline<L: LandmarkDetector, S: PoseSolver, C: PoseConsumer> {
    detector: L,
    fallback: Option<Box<dyn FaceDetector<Image = L::Image>>>,
    model: FaceModel3D,
    intrinsics: CameraIntrinsics,
    stabilizer: TemporalStabilizer<S>,
    shaper: AngleShaper,
    consumer: C,
    frame_size: (f64, f64),
    frame_count: u64,
}

impl<L: LandmarkDetector, S: PoseSolver, C: PoseConsumer> PosePipeline<L, S, C> {
    /// Build a pipeline from validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the face model
    /// cannot be loaded
    pub fn new(detector: L, solver: S, consumer: C, config: &Config) -> Result<Self> {
        config.validate()?;

        let model = config.face_model()?;
        let intrinsics = config.camera.intrinsics();
        info!(
            "Camera intrinsics: fx={}, fy={}, cx={}, cy={}",
            intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy
        );

        Ok(Self {
            detector,
            fallback: None,
            model,
            intrinsics,
            stabilizer: TemporalStabilizer::new(solver, config.stabilizer.params()),
            shaper: AngleShaper::new(config.shaping),
            consumer,
            frame_size: (f64::from(config.camera.frame_width), f64::from(config.camera.frame_height)),
            frame_count: 0,
        })
    }

    /// Consult `fallback` on frames where the primary detector finds no face
    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<dyn FaceDetector<Image = L::Image>>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Process one frame and call the consumer exactly once.
    ///
    /// # Errors
    ///
    /// Propagates detector failures and [`crate::Error::DegenerateInput`]
    /// for landmark arrays that do not cover the correspondence indices; the
    /// consumer is not called for such frames.
    pub fn process_frame(&mut self, image: &L::Image) -> Result<FrameReport> {
        let frame = self.frame_count;
        self.frame_count += 1;

        let stabilized = match self.find_face(image)? {
            Some(region) => {
                let landmarks = self.detector.detect_landmarks(image, region)?;
                let points = select_correspondences(&landmarks)?;
                self.stabilizer.process(&points, &self.model, &self.intrinsics)?
            }
            None => {
                debug!("Frame {frame}: no face detected");
                StabilizedFrame::neutral(FrameOutcome::NoFace)
            }
        };

        let angles = self.shaper.shape(stabilized.angles);
        self.consumer.update_pose(angles.pitch, angles.yaw, angles.roll);

        debug!(
            "Frame {frame}: {} pitch={:.2}° yaw={:.2}° roll={:.2}°",
            stabilized.outcome.as_str(),
            angles.pitch,
            angles.yaw,
            angles.roll
        );
        Ok(FrameReport {
            frame,
            angles,
            stabilized,
        })
    }

    fn find_face(&mut self, image: &L::Image) -> Result<Option<Rect>> {
        let faces = self.detector.detect_faces(image)?;
        if faces.len() > 1 {
            debug!("{} faces detected, tracking the first", faces.len());
        }
        if let Some(face) = faces.into_iter().next() {
            return Ok(Some(face));
        }

        let Some(fallback) = self.fallback.as_mut() else {
            return Ok(None);
        };
        let Some(face) = fallback.detect_face(image)? else {
            return Ok(None);
        };

        warn!("Primary detector found no face, using fallback detection");
        let (width, height) = self.frame_size;
        Ok(Some(face.refined(width, height, FALLBACK_BOX_SHIFT)))
    }

    #[must_use]
    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    #[must_use]
    pub fn stabilizer(&self) -> &TemporalStabilizer<S> {
        &self.stabilizer
    }

    #[must_use]
    pub fn detector(&self) -> &L {
        &self.detector
    }

    /// Frames processed so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Return the stabilizer to `NoPriorPose`
    pub fn reset(&mut self) {
        info!("Resetting pipeline state");
        self.stabilizer.reset();
    }

    /// Hand back the consumer
    pub fn into_consumer(self) -> C {
        self.consumer
    }
}
