//! Keypoint evaluation
//!
//! Scores a single joint's measured angle against its target with a three-band
//! piecewise-linear curve:
//! - within tolerance: 100 down to 80
//! - one to two tolerances: 60 down to 20
//! - beyond two tolerances: 30 down to 0

use crate::config::DEFAULT_VISIBILITY_THRESHOLD;
use crate::landmarks::BodyLandmark;
use crate::types::{KeypointEvaluation, KeypointStatus, PoseSnapshot};
use crate::wiring::wiring_for;

pub const FEEDBACK_NOT_VISIBLE: &str = "Landmark not visible";
pub const FEEDBACK_CORRECT: &str = "Form correct";
pub const FEEDBACK_TOO_LARGE: &str = "Angle too large";
pub const FEEDBACK_TOO_SMALL: &str = "Angle too small";
pub const FEEDBACK_UNMEASURABLE: &str = "Pose geometry unreadable";
pub const FEEDBACK_INVALID_REFERENCE: &str = "Invalid reference angle";

/// Evaluate one joint with the default visibility threshold
pub fn evaluate_keypoint(
    pose: &PoseSnapshot,
    joint_name: &str,
    target_angle: f64,
    tolerance: f64,
) -> KeypointEvaluation {
    KeypointEvaluator::default().evaluate(pose, joint_name, target_angle, tolerance)
}

/// Keypoint evaluator with a configurable visibility gate
#[derive(Debug, Clone, Copy)]
pub struct KeypointEvaluator {
    visibility_threshold: f64,
}

impl Default for KeypointEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

impl KeypointEvaluator {
    pub fn new(visibility_threshold: f64) -> Self {
        Self {
            visibility_threshold,
        }
    }

    pub fn evaluate(
        &self,
        pose: &PoseSnapshot,
        joint_name: &str,
        target_angle: f64,
        tolerance: f64,
    ) -> KeypointEvaluation {
        let joint = match BodyLandmark::from_name(joint_name) {
            Some(joint) => joint,
            None => return not_visible(joint_name),
        };

        if !self.is_visible(pose, joint) {
            return not_visible(joint_name);
        }

        let wiring = match wiring_for(joint) {
            Some(wiring) => wiring,
            None => {
                return KeypointEvaluation {
                    joint: joint_name.to_string(),
                    score: 0.0,
                    feedback: format!("No reference angle for {}", joint_name),
                    status: KeypointStatus::Unmeasurable,
                    angle: None,
                }
            }
        };

        if !wiring.landmarks().iter().all(|l| self.is_visible(pose, *l)) {
            return not_visible(joint_name);
        }

        let current_angle = wiring.measure(pose);
        if !current_angle.is_finite() {
            return KeypointEvaluation {
                joint: joint_name.to_string(),
                score: 0.0,
                feedback: FEEDBACK_UNMEASURABLE.to_string(),
                status: KeypointStatus::Unmeasurable,
                angle: None,
            };
        }

        if !is_valid_reference(target_angle, tolerance) {
            return KeypointEvaluation {
                joint: joint_name.to_string(),
                score: 0.0,
                feedback: FEEDBACK_INVALID_REFERENCE.to_string(),
                status: KeypointStatus::Unmeasurable,
                angle: Some(current_angle),
            };
        }

        let (score, status) = score_deviation(current_angle - target_angle, tolerance);
        let feedback = match status {
            KeypointStatus::Correct => FEEDBACK_CORRECT.to_string(),
            KeypointStatus::Deviating => {
                format!("Off by {:.1}°", (current_angle - target_angle).abs())
            }
            _ if current_angle > target_angle => FEEDBACK_TOO_LARGE.to_string(),
            _ => FEEDBACK_TOO_SMALL.to_string(),
        };

        KeypointEvaluation {
            joint: joint_name.to_string(),
            score,
            feedback,
            status,
            angle: Some(current_angle),
        }
    }

    fn is_visible(&self, pose: &PoseSnapshot, which: BodyLandmark) -> bool {
        pose.landmark(which).visibility >= self.visibility_threshold
    }
}

/// Score a signed angular deviation against a tolerance.
///
/// Returns the score (0-100) and the band it fell into. Exactly 80 at
/// `|deviation| == tolerance` and exactly 20 at `|deviation| == 2 * tolerance`.
///
/// A non-finite deviation or a tolerance that is not a positive finite number
/// scores 0 as `Unmeasurable`.
pub fn score_deviation(deviation: f64, tolerance: f64) -> (f64, KeypointStatus) {
    if !deviation.is_finite() || !is_valid_reference(0.0, tolerance) {
        return (0.0, KeypointStatus::Unmeasurable);
    }
    let diff = deviation.abs();

    if diff <= tolerance {
        (100.0 - (diff / tolerance) * 20.0, KeypointStatus::Correct)
    } else if diff <= tolerance * 2.0 {
        (
            60.0 - ((diff - tolerance) / tolerance) * 40.0,
            KeypointStatus::Deviating,
        )
    } else {
        (
            (30.0 - ((diff - tolerance * 2.0) / tolerance) * 20.0).max(0.0),
            KeypointStatus::Incorrect,
        )
    }
}

fn is_valid_reference(target_angle: f64, tolerance: f64) -> bool {
    target_angle.is_finite() && tolerance.is_finite() && tolerance > 0.0
}

fn not_visible(joint_name: &str) -> KeypointEvaluation {
    KeypointEvaluation {
        joint: joint_name.to_string(),
        score: 0.0,
        feedback: FEEDBACK_NOT_VISIBLE.to_string(),
        status: KeypointStatus::NotVisible,
        angle: None,
    }
}
