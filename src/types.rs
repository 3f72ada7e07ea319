//! Core types for the Taiji Form engine
//!
//! This module defines the data that flows through each stage of evaluation:
//! landmark snapshots in, reference action definitions, and per-keypoint and
//! per-pose evaluation results out.

use crate::error::EngineError;
use crate::landmarks::{BodyLandmark, LANDMARK_COUNT};
use serde::{Deserialize, Serialize};

/// A single normalized body keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position (0-1, image space)
    pub x: f64,
    /// Vertical position (0-1, image space, grows downward)
    pub y: f64,
    /// Depth estimate, unused by the engine
    #[serde(default)]
    pub z: f64,
    /// Detector confidence (0-1)
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }
}

/// The full ordered set of landmarks at one instant.
///
/// Always holds exactly [`LANDMARK_COUNT`] entries, indexed by [`BodyLandmark`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct PoseSnapshot {
    landmarks: Vec<Landmark>,
}

impl PoseSnapshot {
    /// Build a snapshot, rejecting sequences of the wrong length
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, EngineError> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(EngineError::InvalidSnapshot(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                landmarks.len()
            )));
        }
        Ok(Self { landmarks })
    }

    /// A snapshot with every landmark at the same position and confidence
    pub fn uniform(landmark: Landmark) -> Self {
        Self {
            landmarks: vec![landmark; LANDMARK_COUNT],
        }
    }

    pub fn landmark(&self, which: BodyLandmark) -> &Landmark {
        &self.landmarks[which.index()]
    }

    /// Replace one landmark, returning the updated snapshot
    pub fn with_landmark(mut self, which: BodyLandmark, landmark: Landmark) -> Self {
        self.landmarks[which.index()] = landmark;
        self
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

impl TryFrom<Vec<Landmark>> for PoseSnapshot {
    type Error = EngineError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::new(landmarks)
    }
}

impl From<PoseSnapshot> for Vec<Landmark> {
    fn from(snapshot: PoseSnapshot) -> Self {
        snapshot.landmarks
    }
}

/// Target angle for one joint within an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointSpec {
    /// Joint name as used in the landmark table (e.g. "left_elbow")
    pub name: String,
    /// Target joint angle (degrees)
    pub target_angle: f64,
    /// Accepted deviation (degrees, > 0)
    pub tolerance: f64,
}

impl KeypointSpec {
    pub fn new(name: &str, target_angle: f64, tolerance: f64) -> Self {
        Self {
            name: name.to_string(),
            target_angle,
            tolerance,
        }
    }
}

/// A named sub-phase of an action's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Half-open progress range `[start, end)` within `[0, 1]`
    pub progress: (f64, f64),
    pub description: String,
}

impl Stage {
    pub fn new(name: &str, start: f64, end: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            progress: (start, end),
            description: description.to_string(),
        }
    }

    pub fn contains(&self, progress: f64) -> bool {
        progress >= self.progress.0 && progress < self.progress.1
    }
}

/// A reference exercise posture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub description: String,
    /// Nominal duration used to derive progress from elapsed time
    pub duration_seconds: f64,
    pub keypoints: Vec<KeypointSpec>,
    pub stages: Vec<Stage>,
}

impl Action {
    /// Find the stage whose range contains `progress`.
    ///
    /// Ranges are half-open, so `progress == 1.0` selects no stage.
    pub fn stage_at(&self, progress: f64) -> Option<&Stage> {
        self.stages.iter().find(|s| s.contains(progress))
    }
}

/// Outcome class of a single keypoint evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointStatus {
    /// Within tolerance
    Correct,
    /// Between one and two tolerances away
    Deviating,
    /// More than two tolerances away
    Incorrect,
    /// A required landmark was missing or below the confidence threshold
    NotVisible,
    /// No angle could be measured, or the reference target/tolerance is invalid
    Unmeasurable,
}

/// Per-joint evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointEvaluation {
    pub joint: String,
    /// Score (0-100)
    pub score: f64,
    pub feedback: String,
    pub status: KeypointStatus,
    /// Measured angle (degrees), when one was computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

/// Aggregate result for one snapshot against one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEvaluation {
    /// Rounded mean of the keypoint scores (0-100)
    pub score: u8,
    pub feedback: String,
    /// One entry per keypoint, in the action's order
    pub details: Vec<KeypointEvaluation>,
}
