//! End-to-end tests through the public API

use pretty_assertions::assert_eq;
use taiji_form::keypoint::{FEEDBACK_CORRECT, FEEDBACK_NOT_VISIBLE};
use taiji_form::{
    angle_at, evaluate_keypoint, evaluate_pose, ActionCatalog, BodyLandmark, EngineConfig,
    KeypointStatus, Landmark, PoseSnapshot, SessionPhase, SessionTracker, SnapshotRecord,
    TimelineDriver,
};

fn point(x: f64, y: f64) -> Landmark {
    Landmark::new(x, y, 0.0, 0.9)
}

/// Left elbow bent to exactly 90°
fn right_angle_elbow() -> PoseSnapshot {
    PoseSnapshot::uniform(point(0.5, 0.5))
        .with_landmark(BodyLandmark::LeftShoulder, point(0.5, 0.3))
        .with_landmark(BodyLandmark::LeftElbow, point(0.5, 0.5))
        .with_landmark(BodyLandmark::LeftWrist, point(0.7, 0.5))
}

fn commencement_pose() -> PoseSnapshot {
    PoseSnapshot::uniform(point(0.5, 0.5))
        .with_landmark(BodyLandmark::LeftShoulder, point(0.4, 0.3))
        .with_landmark(BodyLandmark::LeftElbow, point(0.25, 0.3))
        .with_landmark(BodyLandmark::LeftWrist, point(0.1, 0.3))
        .with_landmark(BodyLandmark::LeftHip, point(0.4, 0.6))
        .with_landmark(BodyLandmark::RightShoulder, point(0.6, 0.3))
        .with_landmark(BodyLandmark::RightElbow, point(0.75, 0.3))
        .with_landmark(BodyLandmark::RightWrist, point(0.9, 0.3))
        .with_landmark(BodyLandmark::RightHip, point(0.6, 0.6))
}

fn arms_down_pose() -> PoseSnapshot {
    PoseSnapshot::uniform(point(0.5, 0.5))
        .with_landmark(BodyLandmark::LeftShoulder, point(0.4, 0.3))
        .with_landmark(BodyLandmark::LeftElbow, point(0.4, 0.45))
        .with_landmark(BodyLandmark::LeftWrist, point(0.4, 0.6))
        .with_landmark(BodyLandmark::LeftHip, point(0.42, 0.6))
        .with_landmark(BodyLandmark::RightShoulder, point(0.6, 0.3))
        .with_landmark(BodyLandmark::RightElbow, point(0.6, 0.45))
        .with_landmark(BodyLandmark::RightWrist, point(0.6, 0.6))
        .with_landmark(BodyLandmark::RightHip, point(0.58, 0.6))
}

#[test]
fn test_angle_reference_points() {
    let angle = angle_at(&point(0.0, 0.0), &point(1.0, 0.0), &point(1.0, 1.0));
    assert!((angle - 90.0).abs() < 0.5, "angle was {}", angle);

    let straight = angle_at(&point(0.0, 0.0), &point(1.0, 1.0), &point(2.0, 2.0));
    assert!((straight - 180.0).abs() < 1e-9);
}

#[test]
fn test_angle_is_symmetric() {
    let a = point(0.12, 0.8);
    let b = point(0.4, 0.35);
    let c = point(0.9, 0.55);
    assert!((angle_at(&a, &b, &c) - angle_at(&c, &b, &a)).abs() < 1e-9);
}

#[test]
fn test_low_confidence_shoulder_scores_zero() {
    let pose = commencement_pose().with_landmark(
        BodyLandmark::LeftShoulder,
        Landmark::new(0.4, 0.3, 0.0, 0.1),
    );
    let result = evaluate_keypoint(&pose, "left_shoulder", 90.0, 20.0);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.feedback, FEEDBACK_NOT_VISIBLE);
    assert_eq!(result.status, KeypointStatus::NotVisible);
}

#[test]
fn test_visibility_at_threshold_counts_as_visible() {
    let pose = right_angle_elbow().with_landmark(
        BodyLandmark::LeftElbow,
        Landmark::new(0.5, 0.5, 0.0, 0.3),
    );
    let result = evaluate_keypoint(&pose, "left_elbow", 90.0, 15.0);
    assert_eq!(result.status, KeypointStatus::Correct);
}

#[test]
fn test_scoring_breakpoints() {
    let pose = right_angle_elbow();

    let exact = evaluate_keypoint(&pose, "left_elbow", 90.0, 20.0);
    assert!((exact.score - 100.0).abs() < 1e-9);
    assert_eq!(exact.feedback, FEEDBACK_CORRECT);

    let at_tolerance = evaluate_keypoint(&pose, "left_elbow", 70.0, 20.0);
    assert!((at_tolerance.score - 80.0).abs() < 1e-6);
    assert_eq!(at_tolerance.status, KeypointStatus::Correct);

    let at_double = evaluate_keypoint(&pose, "left_elbow", 50.0, 20.0);
    assert!((at_double.score - 20.0).abs() < 1e-6);
    assert_eq!(at_double.status, KeypointStatus::Deviating);

    let far = evaluate_keypoint(&pose, "left_elbow", 0.0, 20.0);
    assert_eq!(far.score, 0.0);
    assert_eq!(far.status, KeypointStatus::Incorrect);
}

#[test]
fn test_pose_score_is_rounded_mean() {
    let catalog = ActionCatalog::builtin();
    for action in catalog.iter() {
        for pose in [commencement_pose(), arms_down_pose(), right_angle_elbow()] {
            let evaluation = evaluate_pose(&pose, action);
            assert_eq!(evaluation.details.len(), action.keypoints.len());

            let mean = evaluation.details.iter().map(|d| d.score).sum::<f64>()
                / evaluation.details.len() as f64;
            assert_eq!(evaluation.score, mean.round() as u8);
        }
    }
}

#[test]
fn test_stage_lookup_grid() {
    let action = ActionCatalog::builtin().get("Commencement").unwrap();
    let names: Vec<&str> = action.stages.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(action.stage_at(0.15).map(|s| s.name.as_str()), Some(names[0]));
    assert_eq!(action.stage_at(0.2).map(|s| s.name.as_str()), Some(names[1]));
    assert_eq!(action.stage_at(0.99).map(|s| s.name.as_str()), Some(names[3]));
    assert!(action.stage_at(1.0).is_none());
}

#[test]
fn test_combo_counts_only_good_snapshots() {
    let mut session = SessionTracker::with_builtin_catalog();
    session.start();

    let poses = [
        commencement_pose(),
        arms_down_pose(),
        commencement_pose(),
        arms_down_pose(),
        commencement_pose(),
    ];
    let mut expected = 0;
    for pose in poses {
        let evaluation = session.ingest_snapshot(pose).unwrap();
        if evaluation.score >= 70 {
            expected += 1;
        }
        assert_eq!(session.state().combo_count, expected);
    }
    assert_eq!(expected, 3);
}

#[test]
fn test_break_combo_on_miss() {
    let config = EngineConfig {
        break_combo_on_miss: true,
        ..EngineConfig::default()
    };
    let mut session = SessionTracker::with_config(ActionCatalog::builtin(), config).unwrap();
    session.start();

    session.ingest_snapshot(commencement_pose());
    session.ingest_snapshot(commencement_pose());
    assert_eq!(session.state().combo_count, 2);

    session.ingest_snapshot(arms_down_pose());
    assert_eq!(session.state().combo_count, 0);
}

#[test]
fn test_unknown_action_leaves_session_unchanged() {
    let mut session = SessionTracker::with_builtin_catalog();
    session.start();
    session.set_progress(0.4);

    assert!(session.select_action("Single Whip").is_err());
    assert_eq!(session.state().current_action.as_deref(), Some("Commencement"));
    assert!((session.state().action_progress - 0.4).abs() < 1e-9);
}

#[test]
fn test_ndjson_stream_through_timeline() {
    let landmarks: Vec<Landmark> = commencement_pose().landmarks().to_vec();
    let ndjson: String = (0..6)
        .map(|second| {
            let record = serde_json::json!({
                "timestamp": format!("2024-01-15T14:00:0{}Z", second),
                "landmarks": landmarks,
            });
            format!("{}\n", record)
        })
        .collect();

    let records = SnapshotRecord::parse_ndjson(&ndjson).unwrap();
    let mut driver = TimelineDriver::new(SessionTracker::with_builtin_catalog());
    let outputs = driver.process_all(records);

    assert_eq!(outputs.len(), 6);
    assert_eq!(outputs[0].stage.as_deref(), Some("Prepare"));
    assert_eq!(outputs[5].phase, SessionPhase::Completed);

    // Five scored frames before the 5 second action completes
    let scored = outputs.iter().filter(|o| o.score.is_some()).count();
    assert_eq!(scored, 5);
    assert_eq!(driver.session().state().combo_count, 5);
}
