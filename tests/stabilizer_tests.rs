//! Temporal stabilizer behavior over frame sequences


use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use neck_tracker::{
    face_model::{select_correspondences, FaceModel3D},
    filters::{
        deadband::Deadband,
        low_pass::{blend, PoseLowPassFilter, TrackingState},
        median::AngleHistory,
    },
    geometry::EulerAngles,
    pose_estimation::{RansacPnpSolver, RawPose},
    stabilizer::{FrameOutcome, StabilizerParams, TemporalStabilizer},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use test_helpers::{camera, head_pose, project, shifted, synthesize_landmarks, ScriptedSolver};

fn correspondences_at(shift: f64) -> neck_tracker::face_model::Correspondences {
    let landmarks = shifted(&synthesize_landmarks(&head_pose(0.0, 0.0)), shift, 0.0);
    select_correspondences(&landmarks).unwrap()
}

#[test]
fn test_stationary_face_tracks_once_then_holds() {
    let pose = head_pose(10.0, 0.0);
    let points = select_correspondences(&synthesize_landmarks(&pose)).unwrap();
    let model = FaceModel3D::default();
    let mut stabilizer = TemporalStabilizer::new(RansacPnpSolver::default(), StabilizerParams::default());

    let first = stabilizer.process(&points, &model, &camera()).unwrap();
    assert_eq!(first.outcome, FrameOutcome::Tracked);
    assert_abs_diff_eq!(first.angles.yaw, 10.0, epsilon = 1e-3);
    assert_abs_diff_eq!(first.angles.pitch, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(first.angles.roll, 0.0, epsilon = 1e-9);

    let tracked_pose = *stabilizer.state().raw_pose().unwrap();
    for _ in 0..19 {
        let frame = stabilizer.process(&points, &model, &camera()).unwrap();
        assert_eq!(frame.outcome, FrameOutcome::Still);
        assert_eq!(frame.angles, EulerAngles::NEUTRAL);
    }
    assert_eq!(stabilizer.state().raw_pose(), Some(&tracked_pose));
    assert_eq!(stabilizer.state().history().len(), 1);
}

#[test]
fn test_subpixel_jitter_is_still() {
    let solver = ScriptedSolver::new(vec![Some(head_pose(0.0, 0.0))]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    let model = FaceModel3D::default();

    stabilizer.process(&correspondences_at(0.0), &model, &camera()).unwrap();
    let state_before = stabilizer.state().clone();

    let frame = stabilizer.process(&correspondences_at(0.6), &model, &camera()).unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Still);
    assert_eq!(stabilizer.solver().calls, 1);
    assert_eq!(stabilizer.state().raw_pose(), state_before.raw_pose());
    assert_eq!(stabilizer.state().snapshot(), state_before.snapshot());
    assert_eq!(stabilizer.state().history().len(), state_before.history().len());
}

#[test]
fn test_movement_above_threshold_is_solved() {
    let solver = ScriptedSolver::new(vec![Some(head_pose(0.0, 0.0)), Some(head_pose(0.0, 0.0))]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    let model = FaceModel3D::default();

    stabilizer.process(&correspondences_at(0.0), &model, &camera()).unwrap();
    let frame = stabilizer.process(&correspondences_at(1.5), &model, &camera()).unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Tracked);
}

#[test]
fn test_solve_failures_keep_filter_state() {
    let first = head_pose(20.0, 0.0);
    let recovered = head_pose(0.0, 0.0);
    let mut script = vec![Some(first)];
    script.extend([None; 5]);
    script.push(Some(recovered));

    let params = StabilizerParams::default();
    let mut stabilizer = TemporalStabilizer::new(ScriptedSolver::new(script), params);
    let model = FaceModel3D::default();

    let frame = stabilizer.process(&correspondences_at(0.0), &model, &camera()).unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Tracked);

    for i in 1..=5 {
        let frame = stabilizer
            .process(&correspondences_at(5.0 * f64::from(i)), &model, &camera())
            .unwrap();
        assert_eq!(frame.outcome, FrameOutcome::SolveFailed);
        assert_eq!(frame.angles, EulerAngles::NEUTRAL);
        assert_eq!(stabilizer.state().raw_pose(), Some(&first));
        assert_eq!(stabilizer.state().history().len(), 1);
    }

    let frame = stabilizer.process(&correspondences_at(40.0), &model, &camera()).unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Tracked);
    let expected = blend(&first, &recovered, params.alpha);
    assert_eq!(stabilizer.state().raw_pose(), Some(&expected));
}

#[test]
fn test_failed_solve_still_updates_snapshot() {
    let solver = ScriptedSolver::new(vec![Some(head_pose(0.0, 0.0)), None]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    let model = FaceModel3D::default();

    stabilizer.process(&correspondences_at(0.0), &model, &camera()).unwrap();
    let failed = stabilizer.process(&correspondences_at(10.0), &model, &camera()).unwrap();
    assert_eq!(failed.outcome, FrameOutcome::SolveFailed);
    assert_eq!(stabilizer.state().snapshot(), Some(&correspondences_at(10.0)));

    // Same landmarks as the failed frame: compared against the new snapshot
    let frame = stabilizer.process(&correspondences_at(10.0), &model, &camera()).unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Still);
}

#[test]
fn test_no_stillness_gate_before_first_pose() {
    let solver = ScriptedSolver::new(vec![None, Some(head_pose(0.0, 0.0))]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    let model = FaceModel3D::default();

    let points = correspondences_at(0.0);
    assert_eq!(
        stabilizer.process(&points, &model, &camera()).unwrap().outcome,
        FrameOutcome::SolveFailed
    );
    assert!(!stabilizer.state().tracking_state().is_tracking());
    assert_eq!(
        stabilizer.process(&points, &model, &camera()).unwrap().outcome,
        FrameOutcome::Tracked
    );
    assert_eq!(stabilizer.solver().calls, 2);
}

#[test]
fn test_low_pass_convergence_is_monotonic_in_alpha() {
    let start = RawPose::new(Vector3::new(3.0, 0.1, 0.0), Vector3::new(0.0, 0.0, 900.0));
    let target = RawPose::new(Vector3::new(3.1, 0.0, 0.05), Vector3::new(10.0, -5.0, 1000.0));
    let distance =
        |pose: &RawPose| (pose.translation - target.translation).norm() + (pose.rotation - target.rotation).norm();

    let mut errors_by_alpha = Vec::new();
    for alpha in [0.1, 0.2, 0.5, 1.0] {
        let mut filter = PoseLowPassFilter::with_state(alpha, TrackingState::Tracking(start));
        let mut previous = distance(&start);
        for _ in 0..5 {
            let pose = filter.apply(&target);
            let current = distance(&pose);
            assert!(current <= previous, "alpha {alpha}: {current} > {previous}");
            previous = current;
        }
        assert_abs_diff_eq!(previous, distance(&start) * (1.0 - alpha).powi(5), epsilon = 1e-9);
        errors_by_alpha.push(previous);
    }
    assert!(errors_by_alpha.windows(2).all(|w| w[0] > w[1]));
    assert_abs_diff_eq!(errors_by_alpha[3], 0.0, epsilon = 1e-12);
}

#[test]
fn test_median_rejects_single_spike() {
    let steady = head_pose(5.0, 0.0);
    let mut script = vec![Some(steady); 7];
    script.push(Some(head_pose(60.0, 0.0)));
    let params = StabilizerParams {
        alpha: 1.0,
        ..StabilizerParams::default()
    };
    let mut stabilizer = TemporalStabilizer::new(ScriptedSolver::new(script), params);
    let model = FaceModel3D::default();

    let mut last = None;
    for i in 0..8 {
        last = Some(
            stabilizer
                .process(&correspondences_at(5.0 * f64::from(i)), &model, &camera())
                .unwrap(),
        );
    }
    let spike_frame = last.unwrap();
    assert_eq!(spike_frame.outcome, FrameOutcome::Tracked);
    assert_abs_diff_eq!(spike_frame.angles.yaw, steady.euler().yaw, epsilon = 1e-9);
}

#[test]
fn test_noisy_convergence_is_faster_for_larger_alpha() {
    let start = RawPose::new(Vector3::new(3.0, 0.0, 0.0), Vector3::new(200.0, 0.0, 1000.0));
    let target = RawPose::new(Vector3::new(3.1, 0.05, 0.0), Vector3::new(0.0, 0.0, 1000.0));
    let distance =
        |pose: &RawPose| (pose.translation - target.translation).norm() + (pose.rotation - target.rotation).norm();
    let epsilon = 5.0;

    let mut frames_by_alpha = Vec::new();
    for alpha in [0.1, 0.2, 0.5, 1.0] {
        let mut rng = StdRng::seed_from_u64(17);
        let mut filter = PoseLowPassFilter::with_state(alpha, TrackingState::Tracking(start));
        let frames = (1..=200)
            .find(|_| {
                let mut jitter = || rng.gen_range(-0.5..=0.5);
                let observed = RawPose::new(
                    target.rotation + Vector3::new(jitter(), jitter(), jitter()) * 0.002,
                    target.translation + Vector3::new(jitter(), jitter(), jitter()),
                );
                distance(&filter.apply(&observed)) < epsilon
            })
            .unwrap();
        frames_by_alpha.push(frames);
    }

    assert!(frames_by_alpha.windows(2).all(|w| w[0] > w[1]), "{frames_by_alpha:?}");
    assert_eq!(frames_by_alpha[3], 1);
}

#[test]
fn test_median_holds_steady_stream_through_early_spike() {
    let mut history = AngleHistory::new(15);
    for frame in 0..20 {
        let yaw = if frame == 4 { 50.0 } else { 0.0 };
        history.push(EulerAngles::new(0.0, yaw, 0.0));
        assert_eq!(history.median(), EulerAngles::NEUTRAL, "frame {frame}");
    }
    assert!(history.has_wrapped());
}

#[test]
fn test_stabilizer_output_ignores_early_spike_every_frame() {
    let steady = head_pose(0.0, 0.0);
    let mut script = vec![Some(steady); 16];
    script[4] = Some(head_pose(50.0, 0.0));
    let params = StabilizerParams {
        alpha: 1.0,
        ..StabilizerParams::default()
    };
    let mut stabilizer = TemporalStabilizer::new(ScriptedSolver::new(script), params);
    let model = FaceModel3D::default();

    for i in 0..16 {
        let frame = stabilizer
            .process(&correspondences_at(5.0 * f64::from(i)), &model, &camera())
            .unwrap();
        assert_eq!(frame.outcome, FrameOutcome::Tracked, "frame {i}");
        assert_abs_diff_eq!(frame.angles.yaw, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_median_window_evicts_old_values() {
    let mut history = AngleHistory::new(3);
    for yaw in [1.0, 2.0, 3.0, 10.0, 11.0] {
        history.push(EulerAngles::new(0.0, yaw, 0.0));
    }
    assert!(history.has_wrapped());
    assert_eq!(history.median().yaw, 10.0);
}

#[test]
fn test_deadband_boundary() {
    let deadband = Deadband::new(0.4);
    assert_eq!(deadband.suppress(0.399), 0.0);
    assert_eq!(deadband.suppress(-0.399), 0.0);
    assert_eq!(deadband.suppress(0.4), 0.4);
    assert_eq!(deadband.suppress(-0.4), -0.4);
}

#[test]
fn test_small_rotation_inside_deadband_reads_zero() {
    let solver = ScriptedSolver::new(vec![Some(head_pose(0.3, 0.0))]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    let frame = stabilizer
        .process(&project(&head_pose(0.3, 0.0)), &FaceModel3D::default(), &camera())
        .unwrap();
    assert_eq!(frame.outcome, FrameOutcome::Tracked);
    assert_eq!(frame.angles.yaw, 0.0);
}

#[test]
fn test_reset_returns_to_no_prior_pose() {
    let solver = ScriptedSolver::new(vec![Some(head_pose(0.0, 0.0))]);
    let mut stabilizer = TemporalStabilizer::new(solver, StabilizerParams::default());
    stabilizer
        .process(&correspondences_at(0.0), &FaceModel3D::default(), &camera())
        .unwrap();
    assert!(stabilizer.state().tracking_state().is_tracking());

    stabilizer.reset();
    assert!(!stabilizer.state().tracking_state().is_tracking());
    assert!(stabilizer.state().snapshot().is_none());
    assert!(stabilizer.state().history().is_empty());
}
