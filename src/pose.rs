//! Pose evaluation
//!
//! Aggregates per-keypoint results for one action into a single score and a
//! human-readable summary.

use crate::keypoint::KeypointEvaluator;
use crate::types::{Action, KeypointEvaluation, PoseEvaluation, PoseSnapshot};

pub const FEEDBACK_EXCELLENT: &str = "Excellent form!";
pub const FEEDBACK_GOOD_GENERIC: &str = "Good overall, keep going";
pub const FEEDBACK_ADJUST_GENERIC: &str = "Keep adjusting your form";
pub const FEEDBACK_RETRY: &str = "Refer to the reference form and try again";

/// Keypoint score at or above which a joint is praised in the summary
const GOOD_KEYPOINT_SCORE: f64 = 80.0;
/// Keypoint score below which a joint is called out in the summary
const POOR_KEYPOINT_SCORE: f64 = 50.0;

/// Evaluate a snapshot against an action with the default visibility threshold
pub fn evaluate_pose(pose: &PoseSnapshot, action: &Action) -> PoseEvaluation {
    PoseEvaluator::default().evaluate(pose, action)
}

/// Pose evaluator for computing aggregate scores
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseEvaluator {
    keypoints: KeypointEvaluator,
}

impl PoseEvaluator {
    pub fn new(visibility_threshold: f64) -> Self {
        Self {
            keypoints: KeypointEvaluator::new(visibility_threshold),
        }
    }

    /// Evaluate every keypoint of `action` and summarize
    pub fn evaluate(&self, pose: &PoseSnapshot, action: &Action) -> PoseEvaluation {
        let details: Vec<KeypointEvaluation> = action
            .keypoints
            .iter()
            .map(|kp| {
                self.keypoints
                    .evaluate(pose, &kp.name, kp.target_angle, kp.tolerance)
            })
            .collect();

        let mean = mean_score(&details);
        let feedback = synthesize_feedback(mean, &details);
        let score = round_score(mean);

        PoseEvaluation {
            score,
            feedback,
            details,
        }
    }
}

/// Unrounded mean of the keypoint scores; 0 when there are none
fn mean_score(details: &[KeypointEvaluation]) -> f64 {
    if details.is_empty() {
        return 0.0;
    }
    details.iter().map(|d| d.score).sum::<f64>() / details.len() as f64
}

fn round_score(mean: f64) -> u8 {
    mean.round().clamp(0.0, 100.0) as u8
}

/// Summary text, banded on the unrounded mean
fn synthesize_feedback(mean: f64, details: &[KeypointEvaluation]) -> String {
    if mean >= 90.0 {
        FEEDBACK_EXCELLENT.to_string()
    } else if mean >= 70.0 {
        let good = join_feedback(details, |d| d.score >= GOOD_KEYPOINT_SCORE);
        match good {
            Some(joined) => format!("{}; keep it up", joined),
            None => FEEDBACK_GOOD_GENERIC.to_string(),
        }
    } else if mean >= 50.0 {
        let poor = join_feedback(details, |d| d.score < POOR_KEYPOINT_SCORE);
        match poor {
            Some(joined) => format!("{}; needs adjustment", joined),
            None => FEEDBACK_ADJUST_GENERIC.to_string(),
        }
    } else {
        FEEDBACK_RETRY.to_string()
    }
}

fn join_feedback<F>(details: &[KeypointEvaluation], keep: F) -> Option<String>
where
    F: Fn(&KeypointEvaluation) -> bool,
{
    let parts: Vec<&str> = details
        .iter()
        .filter(|d| keep(d))
        .map(|d| d.feedback.as_str())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::FEEDBACK_CORRECT;
    use crate::types::{KeypointSpec, KeypointStatus, Stage};

    fn detail(score: f64, feedback: &str) -> KeypointEvaluation {
        KeypointEvaluation {
            joint: "left_elbow".to_string(),
            score,
            feedback: feedback.to_string(),
            status: KeypointStatus::Correct,
            angle: None,
        }
    }

    fn single_stage_action(keypoints: Vec<KeypointSpec>) -> Action {
        Action {
            name: "test".to_string(),
            description: String::new(),
            duration_seconds: 1.0,
            keypoints,
            stages: vec![Stage::new("all", 0.0, 1.0, "")],
        }
    }

    #[test]
    fn test_aggregate_rounds_mean() {
        let mean = mean_score(&[detail(80.0, ""), detail(81.0, "")]);
        assert_eq!(round_score(mean), 81);
        let mean = mean_score(&[detail(80.0, ""), detail(80.9, "")]);
        assert_eq!(round_score(mean), 80);
        assert_eq!(round_score(mean_score(&[])), 0);
    }

    #[test]
    fn test_band_uses_unrounded_mean() {
        // Mean 89.5 rounds to 90 but stays in the good band
        let details = [detail(89.0, "a"), detail(90.0, "b")];
        assert_eq!(round_score(mean_score(&details)), 90);
        assert_eq!(
            synthesize_feedback(mean_score(&details), &details),
            "a, b; keep it up"
        );

        // Mean 69.5 rounds to 70 but stays in the adjust band
        let details = [detail(69.0, "a"), detail(70.0, "b")];
        assert_eq!(round_score(mean_score(&details)), 70);
        assert_eq!(
            synthesize_feedback(mean_score(&details), &details),
            FEEDBACK_ADJUST_GENERIC
        );
    }

    #[test]
    fn test_excellent_band() {
        let details = [detail(95.0, "x"), detail(90.0, "y")];
        assert_eq!(synthesize_feedback(92.5, &details), FEEDBACK_EXCELLENT);
    }

    #[test]
    fn test_good_band_joins_strong_keypoints() {
        let details = [
            detail(85.0, FEEDBACK_CORRECT),
            detail(60.0, "Off by 25.0°"),
            detail(80.0, FEEDBACK_CORRECT),
        ];
        assert_eq!(
            synthesize_feedback(75.0, &details),
            "Form correct, Form correct; keep it up"
        );
    }

    #[test]
    fn test_good_band_without_strong_keypoints() {
        let details = [detail(75.0, "a"), detail(72.0, "b")];
        assert_eq!(synthesize_feedback(73.5, &details), FEEDBACK_GOOD_GENERIC);
    }

    #[test]
    fn test_adjust_band_joins_weak_keypoints() {
        let details = [
            detail(100.0, FEEDBACK_CORRECT),
            detail(20.0, "Angle too small"),
            detail(40.0, "Off by 15.0°"),
            detail(90.0, FEEDBACK_CORRECT),
        ];
        assert_eq!(
            synthesize_feedback(62.5, &details),
            "Angle too small, Off by 15.0°; needs adjustment"
        );
    }

    #[test]
    fn test_adjust_band_without_weak_keypoints() {
        let details = [detail(60.0, "a"), detail(55.0, "b")];
        assert_eq!(synthesize_feedback(57.5, &details), FEEDBACK_ADJUST_GENERIC);
    }

    #[test]
    fn test_retry_band() {
        assert_eq!(synthesize_feedback(49.9, &[]), FEEDBACK_RETRY);
        assert_eq!(synthesize_feedback(0.0, &[]), FEEDBACK_RETRY);
    }

    #[test]
    fn test_details_follow_keypoint_order() {
        let pose = PoseSnapshot::uniform(crate::types::Landmark::new(0.5, 0.5, 0.0, 0.9));
        let action = single_stage_action(vec![
            KeypointSpec::new("right_knee", 160.0, 20.0),
            KeypointSpec::new("left_elbow", 170.0, 15.0),
            KeypointSpec::new("left_wrist", 180.0, 30.0),
        ]);

        let result = evaluate_pose(&pose, &action);
        let joints: Vec<&str> = result.details.iter().map(|d| d.joint.as_str()).collect();
        assert_eq!(joints, vec!["right_knee", "left_elbow", "left_wrist"]);
    }
}
