//! `OpenCV`-backed RANSAC PnP, enabled with the `opencv` feature.

use crate::{
    camera::CameraIntrinsics,
    face_model::{Correspondences, FaceModel3D},
    geometry::closest_equivalent_rotation_vector,
    pose_estimation::{reprojection_errors, PoseSolution, PoseSolver, RansacParams, RawPose},
    Error, Result,
};
use nalgebra::Vector3;
use opencv::{
    calib3d,
    core::{Mat, Vector, CV_64F},
    prelude::*,
};

/// Pose solver delegating to `calib3d::solve_pnp_ransac`
pub struct OpenCvPnpSolver {
    params: RansacParams,
}

impl OpenCvPnpSolver {
    #[must_use]
    pub fn new(params: RansacParams) -> Self {
        log::info!(
            "Initializing OpenCvPnpSolver: max_iterations={}, reprojection_error={}px, confidence={}",
            params.max_iterations,
            params.reprojection_error,
            params.confidence
        );
        Self { params }
    }
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidInput(format!("Value {value} exceeds i32 range")))
}

fn column(values: &Vector3<f64>) -> Result<Mat> {
    let mut mat = Mat::zeros(3, 1, CV_64F)?.to_mat()?;
    for (i, &value) in values.iter().enumerate() {
        *mat.at_2d_mut::<f64>(to_i32(i)?, 0)? = value;
    }
    Ok(mat)
}

fn read_column(mat: &Mat) -> Result<Vector3<f64>> {
    Ok(Vector3::new(
        *mat.at_2d::<f64>(0, 0)?,
        *mat.at_2d::<f64>(1, 0)?,
        *mat.at_2d::<f64>(2, 0)?,
    ))
}

fn camera_matrix(intrinsics: &CameraIntrinsics) -> Result<Mat> {
    let mut mat = Mat::zeros(3, 3, CV_64F)?.to_mat()?;
    let matrix = intrinsics.matrix();
    for i in 0..3 {
        for j in 0..3 {
            *mat.at_2d_mut::<f64>(to_i32(i)?, to_i32(j)?)? = matrix[(i, j)];
        }
    }
    Ok(mat)
}

fn distortion_coefficients(intrinsics: &CameraIntrinsics) -> Result<Mat> {
    let mut mat = Mat::zeros(5, 1, CV_64F)?.to_mat()?;
    for (i, value) in intrinsics.distortion.as_array().into_iter().enumerate() {
        *mat.at_2d_mut::<f64>(to_i32(i)?, 0)? = value;
    }
    Ok(mat)
}

impl PoseSolver for OpenCvPnpSolver {
    fn solve(
        &mut self,
        model: &FaceModel3D,
        image: &Correspondences,
        intrinsics: &CameraIntrinsics,
        seed: Option<&RawPose>,
    ) -> Result<Option<PoseSolution>> {
        let model_points = model.points();
        let rows = to_i32(model_points.len())?;

        let mut object_points = Mat::zeros(rows, 3, CV_64F)?.to_mat()?;
        for (i, point) in model_points.iter().enumerate() {
            let idx = to_i32(i)?;
            *object_points.at_2d_mut::<f64>(idx, 0)? = point.x;
            *object_points.at_2d_mut::<f64>(idx, 1)? = point.y;
            *object_points.at_2d_mut::<f64>(idx, 2)? = point.z;
        }

        let mut image_points = Mat::zeros(rows, 2, CV_64F)?.to_mat()?;
        for (i, point) in image.iter().enumerate() {
            let idx = to_i32(i)?;
            *image_points.at_2d_mut::<f64>(idx, 0)? = point.x;
            *image_points.at_2d_mut::<f64>(idx, 1)? = point.y;
        }

        let (mut rvec, mut tvec) = match seed {
            Some(pose) => (column(&pose.rotation)?, column(&pose.translation)?),
            None => (Mat::default(), Mat::default()),
        };
        let mut inliers = Vector::<i32>::new();

        #[allow(clippy::cast_possible_truncation)]
        let found = calib3d::solve_pnp_ransac(
            &object_points,
            &image_points,
            &camera_matrix(intrinsics)?,
            &distortion_coefficients(intrinsics)?,
            &mut rvec,
            &mut tvec,
            seed.is_some(),
            to_i32(self.params.max_iterations)?,
            self.params.reprojection_error as f32,
            self.params.confidence,
            &mut inliers,
            calib3d::SOLVEPNP_ITERATIVE,
        )?;

        let inliers: Vec<usize> = inliers.iter().filter_map(|i| usize::try_from(i).ok()).collect();
        if !found || inliers.is_empty() || inliers.len() < self.params.min_inliers {
            return Ok(None);
        }

        let mut rotation = read_column(&rvec)?;
        if let Some(pose) = seed {
            rotation = closest_equivalent_rotation_vector(&rotation, &pose.rotation);
        }
        let pose = RawPose::new(rotation, read_column(&tvec)?);

        let errors = reprojection_errors(&pose, model_points, image, intrinsics);
        #[allow(clippy::cast_precision_loss)]
        let mean_error = inliers.iter().filter_map(|&i| errors.get(i)).sum::<f64>() / inliers.len() as f64;

        Ok(Some(PoseSolution {
            pose,
            inliers,
            mean_error,
        }))
    }

    fn name(&self) -> &str {
        "OpenCvPnpSolver"
    }
}
