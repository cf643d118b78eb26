use crate::{
    camera::CameraIntrinsics,
    constants::{
        DEFAULT_MIN_INLIERS, DEFAULT_RANSAC_CONFIDENCE, DEFAULT_RANSAC_ITERATIONS, DEFAULT_RANSAC_SEED,
        DEFAULT_REFINE_ITERATIONS, DEFAULT_REPROJECTION_ERROR, MINIMAL_SAMPLE_SIZE,
    },
    face_model::{Correspondences, FaceModel3D},
    geometry::{
        closest_equivalent_rotation_vector, frontal_rotation_vector, pose_to_euler, rotation_vector_to_matrix,
        EulerAngles,
    },
    Error, Result,
};
use nalgebra::{DMatrix, DVector, Point2, Point3, Vector3};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// Rotation vector (axis-angle) and translation mapping model points into
/// camera coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPose {
    /// Axis-angle rotation, radians
    pub rotation: Vector3<f64>,
    /// Translation in model units
    pub translation: Vector3<f64>,
}

impl RawPose {
    #[must_use]
    pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self { rotation, translation }
    }

    /// Transform a model point into camera coordinates
    #[must_use]
    pub fn transform(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(rotation_vector_to_matrix(&self.rotation) * point.coords + self.translation)
    }

    /// Project model points to pixels; `None` if any lands behind the camera
    #[must_use]
    pub fn project(&self, points: &[Point3<f64>], intrinsics: &CameraIntrinsics) -> Option<Vec<Point2<f64>>> {
        points.iter().map(|p| intrinsics.project(&self.transform(p))).collect()
    }

    /// Pitch/yaw/roll of this pose in degrees
    #[must_use]
    pub fn euler(&self) -> EulerAngles {
        pose_to_euler(&self.rotation)
    }

    fn to_params(self) -> DVector<f64> {
        DVector::from_iterator(6, self.rotation.iter().chain(self.translation.iter()).copied())
    }

    fn from_params(params: &DVector<f64>) -> Self {
        Self::new(
            Vector3::new(params[0], params[1], params[2]),
            Vector3::new(params[3], params[4], params[5]),
        )
    }
}

/// Per-point reprojection error in pixels (infinite for points behind the camera)
#[must_use]
pub fn reprojection_errors(
    pose: &RawPose,
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
) -> Vec<f64> {
    model_points
        .iter()
        .zip(image_points)
        .map(|(model, observed)| {
            intrinsics
                .project(&pose.transform(model))
                .map_or(f64::INFINITY, |projected| (projected - *observed).norm())
        })
        .collect()
}

/// Result of a successful pose solve
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSolution {
    /// Refined pose
    pub pose: RawPose,
    /// Indices of the correspondences that agree with the pose
    pub inliers: Vec<usize>,
    /// Mean reprojection error over the inliers, pixels
    pub mean_error: f64,
}

/// Robust perspective pose solver
pub trait PoseSolver {
    /// Solve for the pose mapping `model` onto `image`.
    ///
    /// `seed` is the previous frame's pose, used as the initial guess.
    /// `Ok(None)` means no candidate reached the minimum inlier set; errors
    /// are reserved for malformed input.
    fn solve(
        &mut self,
        model: &FaceModel3D,
        image: &Correspondences,
        intrinsics: &CameraIntrinsics,
        seed: Option<&RawPose>,
    ) -> Result<Option<PoseSolution>>;

    /// Get solver name
    fn name(&self) -> &str;
}

/// RANSAC and refinement parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacParams {
    /// Hard cap on hypotheses evaluated
    pub max_iterations: usize,
    /// Inlier threshold, pixels
    pub reprojection_error: f64,
    /// Probability that at least one sample is outlier-free
    pub confidence: f64,
    /// Smallest inlier set accepted as a solution
    pub min_inliers: usize,
    /// Levenberg-Marquardt iterations per fit
    pub refine_iterations: usize,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_RANSAC_ITERATIONS,
            reprojection_error: DEFAULT_REPROJECTION_ERROR,
            confidence: DEFAULT_RANSAC_CONFIDENCE,
            min_inliers: DEFAULT_MIN_INLIERS,
            refine_iterations: DEFAULT_REFINE_ITERATIONS,
        }
    }
}

/// Best hypothesis found by [`ransac_pnp`]
#[derive(Debug, Clone, PartialEq)]
pub struct RansacOutcome {
    pub solution: PoseSolution,
    /// Hypotheses evaluated before termination
    pub iterations: usize,
}

/// Number of RANSAC iterations needed to draw one all-inlier sample with
/// probability `confidence`, capped at `max_iterations`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn required_iterations(confidence: f64, inlier_ratio: f64, sample_size: usize, max_iterations: usize) -> usize {
    let failure = (1.0 - confidence.clamp(0.0, 1.0)).max(f64::MIN_POSITIVE);
    let all_inlier = inlier_ratio.clamp(0.0, 1.0).powi(i32::try_from(sample_size).unwrap_or(i32::MAX));
    let miss = 1.0 - all_inlier;
    if miss < f64::MIN_POSITIVE {
        return 0;
    }

    let numerator = failure.ln();
    let denominator = miss.ln();
    if denominator >= 0.0 || -numerator >= max_iterations as f64 * -denominator {
        return max_iterations;
    }
    ((numerator / denominator).round() as usize).min(max_iterations)
}

/// Frontal pose whose projected spread matches the observed points.
fn frontal_initial_guess(
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
) -> Option<RawPose> {
    #[allow(clippy::cast_precision_loss)]
    let n = model_points.len() as f64;
    let rotation = frontal_rotation_vector();
    let matrix = rotation_vector_to_matrix(&rotation);

    let rotated: Vec<Vector3<f64>> = model_points.iter().map(|p| matrix * p.coords).collect();
    let normalized: Vec<Point2<f64>> = image_points
        .iter()
        .map(|p| Point2::new((p.x - intrinsics.cx) / intrinsics.fx, (p.y - intrinsics.cy) / intrinsics.fy))
        .collect();

    let model_centroid = rotated.iter().sum::<Vector3<f64>>() / n;
    let image_centroid = normalized.iter().map(|p| p.coords).sum::<nalgebra::Vector2<f64>>() / n;

    let model_spread = (rotated
        .iter()
        .map(|p| (p.x - model_centroid.x).powi(2) + (p.y - model_centroid.y).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    let image_spread = (normalized
        .iter()
        .map(|p| (p.coords - image_centroid).norm_squared())
        .sum::<f64>()
        / n)
        .sqrt();

    if image_spread < f64::EPSILON || model_spread < f64::EPSILON {
        return None;
    }

    let depth = model_spread / image_spread;
    let translation = Vector3::new(
        image_centroid.x * depth - model_centroid.x,
        image_centroid.y * depth - model_centroid.y,
        depth - model_centroid.z,
    );
    Some(RawPose::new(rotation, translation))
}

fn residuals(
    params: &DVector<f64>,
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
) -> Option<DVector<f64>> {
    let projected = RawPose::from_params(params).project(model_points, intrinsics)?;
    Some(DVector::from_iterator(
        2 * projected.len(),
        projected
            .iter()
            .zip(image_points)
            .flat_map(|(p, o)| [p.x - o.x, p.y - o.y]),
    ))
}

fn jacobian(
    params: &DVector<f64>,
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
) -> Option<DMatrix<f64>> {
    let mut jacobian = DMatrix::zeros(2 * model_points.len(), 6);
    for column in 0..6 {
        let step = 1e-6 * params[column].abs().max(1.0);
        let mut forward = params.clone();
        forward[column] += step;
        let mut backward = params.clone();
        backward[column] -= step;

        let delta = residuals(&forward, model_points, image_points, intrinsics)?
            - residuals(&backward, model_points, image_points, intrinsics)?;
        jacobian.set_column(column, &(delta / (2.0 * step)));
    }
    Some(jacobian)
}

/// Levenberg-Marquardt minimization of the reprojection error from `initial`.
///
/// Returns `None` if the initial pose puts a point behind the camera or the
/// normal equations cannot be solved at any damping.
#[must_use]
pub fn refine_pose(
    initial: &RawPose,
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
    max_iterations: usize,
) -> Option<RawPose> {
    const MAX_DAMPING_STEPS: usize = 10;

    let mut params = initial.to_params();
    let mut residual = residuals(&params, model_points, image_points, intrinsics)?;
    let mut cost = residual.norm_squared();
    let mut lambda = 1e-3;

    for _ in 0..max_iterations {
        if cost < 1e-18 {
            break;
        }
        let jacobian = jacobian(&params, model_points, image_points, intrinsics)?;
        let jt = jacobian.transpose();
        let normal = &jt * &jacobian;
        let gradient = &jt * &residual;

        let mut improved = None;
        for _ in 0..MAX_DAMPING_STEPS {
            let mut damped = normal.clone();
            for i in 0..6 {
                damped[(i, i)] += lambda * normal[(i, i)].max(1e-9);
            }
            let Some(cholesky) = damped.cholesky() else {
                lambda *= 10.0;
                continue;
            };
            let step = cholesky.solve(&(-gradient.clone()));
            let candidate = &params + &step;
            match residuals(&candidate, model_points, image_points, intrinsics) {
                Some(candidate_residual) if candidate_residual.norm_squared() < cost => {
                    improved = Some((candidate, candidate_residual, step.norm()));
                    lambda = (lambda / 10.0).max(1e-12);
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        let Some((candidate, candidate_residual, step_norm)) = improved else {
            break;
        };
        params = candidate;
        cost = candidate_residual.norm_squared();
        residual = candidate_residual;
        if step_norm < 1e-10 {
            break;
        }
    }

    let pose = RawPose::from_params(&params);
    pose.rotation.iter().chain(pose.translation.iter()).all(|v| v.is_finite()).then_some(pose)
}

fn inliers_of(errors: &[f64], threshold: f64) -> Vec<usize> {
    errors
        .iter()
        .enumerate()
        .filter(|&(_, &error)| error < threshold)
        .map(|(i, _)| i)
        .collect()
}

fn mean_over(errors: &[f64], inliers: &[usize]) -> f64 {
    if inliers.is_empty() {
        return f64::INFINITY;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = inliers.len() as f64;
    inliers.iter().map(|&i| errors[i]).sum::<f64>() / count
}

/// RANSAC perspective-n-point over minimal samples of four correspondences.
///
/// Each hypothesis is fitted from `seed` when given, otherwise from a frontal
/// guess matched to the sample. The best hypothesis (most inliers, then
/// lowest mean error) is refined on its inliers. With a seed, the returned
/// rotation vector is the representation closest to the seed's.
pub fn ransac_pnp<R: Rng + ?Sized>(
    params: &RansacParams,
    model_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
    seed: Option<&RawPose>,
    rng: &mut R,
) -> Option<RansacOutcome> {
    let n = model_points.len().min(image_points.len());
    if n < MINIMAL_SAMPLE_SIZE {
        return None;
    }

    let mut best: Option<(RawPose, Vec<usize>, f64)> = None;
    let mut needed = params.max_iterations;
    let mut iterations = 0;

    while iterations < needed {
        iterations += 1;

        let sample = index::sample(&mut *rng, n, MINIMAL_SAMPLE_SIZE);
        let sample_model: Vec<Point3<f64>> = sample.iter().map(|i| model_points[i]).collect();
        let sample_image: Vec<Point2<f64>> = sample.iter().map(|i| image_points[i]).collect();

        let initial = match seed {
            Some(pose) => Some(*pose),
            None => frontal_initial_guess(&sample_model, &sample_image, intrinsics),
        };
        let Some(candidate) = initial
            .and_then(|pose| refine_pose(&pose, &sample_model, &sample_image, intrinsics, params.refine_iterations))
        else {
            continue;
        };

        let errors = reprojection_errors(&candidate, model_points, image_points, intrinsics);
        let inliers = inliers_of(&errors, params.reprojection_error);
        let mean_error = mean_over(&errors, &inliers);

        let is_better = match &best {
            None => !inliers.is_empty(),
            Some((_, best_inliers, best_error)) => {
                inliers.len() > best_inliers.len() || (inliers.len() == best_inliers.len() && mean_error < *best_error)
            }
        };
        if is_better {
            #[allow(clippy::cast_precision_loss)]
            let ratio = inliers.len() as f64 / n as f64;
            needed = required_iterations(params.confidence, ratio, MINIMAL_SAMPLE_SIZE, params.max_iterations);
            best = Some((candidate, inliers, mean_error));
        }
    }

    let (pose, inliers, mean_error) = best?;
    if inliers.len() < params.min_inliers.max(1) {
        log::debug!(
            "RANSAC rejected best hypothesis with {} inliers after {} iterations",
            inliers.len(),
            iterations
        );
        return None;
    }

    let inlier_model: Vec<Point3<f64>> = inliers.iter().map(|&i| model_points[i]).collect();
    let inlier_image: Vec<Point2<f64>> = inliers.iter().map(|&i| image_points[i]).collect();

    let (mut pose, inliers, mean_error) =
        refine_pose(&pose, &inlier_model, &inlier_image, intrinsics, params.refine_iterations)
            .and_then(|refined| {
                let errors = reprojection_errors(&refined, model_points, image_points, intrinsics);
                let refined_inliers = inliers_of(&errors, params.reprojection_error);
                let refined_error = mean_over(&errors, &refined_inliers);
                (refined_inliers.len() >= inliers.len()).then_some((refined, refined_inliers, refined_error))
            })
            .unwrap_or((pose, inliers, mean_error));

    if let Some(seed) = seed {
        pose.rotation = closest_equivalent_rotation_vector(&pose.rotation, &seed.rotation);
    }

    Some(RansacOutcome {
        solution: PoseSolution {
            pose,
            inliers,
            mean_error,
        },
        iterations,
    })
}

/// Default solver: RANSAC over [`ransac_pnp`] with a reproducible RNG
pub struct RansacPnpSolver {
    params: RansacParams,
    rng: StdRng,
}

impl RansacPnpSolver {
    /// Create a solver with fixed RANSAC parameters and RNG seed
    #[must_use]
    pub fn new(params: RansacParams, rng_seed: u64) -> Self {
        log::info!(
            "Initializing RansacPnpSolver: max_iterations={}, reprojection_error={}px, confidence={}",
            params.max_iterations,
            params.reprojection_error,
            params.confidence
        );
        Self {
            params,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    #[must_use]
    pub fn params(&self) -> &RansacParams {
        &self.params
    }
}

impl Default for RansacPnpSolver {
    fn default() -> Self {
        Self::new(RansacParams::default(), DEFAULT_RANSAC_SEED)
    }
}

impl PoseSolver for RansacPnpSolver {
    fn solve(
        &mut self,
        model: &FaceModel3D,
        image: &Correspondences,
        intrinsics: &CameraIntrinsics,
        seed: Option<&RawPose>,
    ) -> Result<Option<PoseSolution>> {
        if self.params.max_iterations == 0 {
            return Err(Error::InvalidInput("RANSAC iteration cap must be positive".to_string()));
        }

        let outcome = ransac_pnp(&self.params, model.points(), image, intrinsics, seed, &mut self.rng);
        match &outcome {
            Some(outcome) => log::debug!(
                "Pose solved with {} inliers, mean error {:.3}px, {} iterations",
                outcome.solution.inliers.len(),
                outcome.solution.mean_error,
                outcome.iterations
            ),
            None => log::debug!("Pose solve found no adequate inlier set"),
        }
        Ok(outcome.map(|outcome| outcome.solution))
    }

    fn name(&self) -> &str {
        "RansacPnpSolver"
    }
}
