//! Action catalog
//!
//! Read-only reference postures, looked up by name. The built-in catalog is
//! created once on first use and never mutated; custom catalogs can be loaded
//! from JSON and are validated on construction.

use crate::error::EngineError;
use crate::landmarks::BodyLandmark;
use crate::types::{Action, KeypointSpec, Stage};
use crate::wiring::wiring_for;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Tolerance for stage boundary comparisons
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Immutable, non-empty table of actions in practice order
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Build a catalog, validating every action
    pub fn new(actions: Vec<Action>) -> Result<Self, EngineError> {
        if actions.is_empty() {
            return Err(EngineError::InvalidCatalog(
                "catalog must contain at least one action".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for action in &actions {
            if !names.insert(action.name.as_str()) {
                return Err(EngineError::InvalidCatalog(format!(
                    "duplicate action name: {}",
                    action.name
                )));
            }
            validate_action(action)?;
        }

        Ok(Self { actions })
    }

    /// Load a catalog from a JSON array of actions
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let actions: Vec<Action> = serde_json::from_str(json)?;
        Self::new(actions)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.actions)?)
    }

    /// The process-wide built-in catalog
    pub fn builtin() -> &'static ActionCatalog {
        static BUILTIN: OnceLock<ActionCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| ActionCatalog {
            actions: builtin_actions(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// First action in practice order
    pub fn first(&self) -> &Action {
        &self.actions[0]
    }

    /// The action following `name`, if any
    pub fn next_after(&self, name: &str) -> Option<&Action> {
        let position = self.actions.iter().position(|a| a.name == name)?;
        self.actions.get(position + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn validate_action(action: &Action) -> Result<(), EngineError> {
    let invalid = |msg: String| EngineError::InvalidCatalog(format!("{}: {}", action.name, msg));

    if !(action.duration_seconds.is_finite() && action.duration_seconds > 0.0) {
        return Err(invalid(format!(
            "duration must be positive, got {}",
            action.duration_seconds
        )));
    }

    if action.keypoints.is_empty() {
        return Err(invalid("at least one keypoint is required".to_string()));
    }

    for keypoint in &action.keypoints {
        let joint = BodyLandmark::from_name(&keypoint.name)
            .ok_or_else(|| invalid(format!("unknown joint {}", keypoint.name)))?;
        if wiring_for(joint).is_none() {
            return Err(invalid(format!("joint {} has no angle wiring", keypoint.name)));
        }
        if !(keypoint.tolerance.is_finite() && keypoint.tolerance > 0.0) {
            return Err(invalid(format!(
                "tolerance for {} must be positive, got {}",
                keypoint.name, keypoint.tolerance
            )));
        }
        if !keypoint.target_angle.is_finite() {
            return Err(invalid(format!("target angle for {} is not finite", keypoint.name)));
        }
    }

    validate_stages(&action.stages).map_err(invalid)
}

/// Stages must tile `[0, 1)` in order without gaps or overlaps
fn validate_stages(stages: &[Stage]) -> Result<(), String> {
    let (first, last) = match (stages.first(), stages.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err("at least one stage is required".to_string()),
    };

    if first.progress.0.abs() > BOUNDARY_EPSILON {
        return Err(format!("first stage {} must start at 0", first.name));
    }
    if (last.progress.1 - 1.0).abs() > BOUNDARY_EPSILON {
        return Err(format!("last stage {} must end at 1", last.name));
    }

    for stage in stages {
        if stage.progress.0 >= stage.progress.1 {
            return Err(format!("stage {} has an empty range", stage.name));
        }
    }

    for pair in stages.windows(2) {
        if (pair[0].progress.1 - pair[1].progress.0).abs() > BOUNDARY_EPSILON {
            return Err(format!(
                "stages {} and {} are not contiguous",
                pair[0].name, pair[1].name
            ));
        }
    }

    Ok(())
}

fn builtin_actions() -> Vec<Action> {
    vec![
        Action {
            name: "Commencement".to_string(),
            description: "Opening form - sink the shoulders, drop the elbows, lift the crown"
                .to_string(),
            duration_seconds: 5.0,
            keypoints: vec![
                KeypointSpec::new("left_elbow", 170.0, 15.0),
                KeypointSpec::new("right_elbow", 170.0, 15.0),
                KeypointSpec::new("left_shoulder", 90.0, 20.0),
                KeypointSpec::new("right_shoulder", 90.0, 20.0),
            ],
            stages: vec![
                Stage::new("Prepare", 0.0, 0.2, "Feet shoulder-width apart"),
                Stage::new("Raise", 0.2, 0.5, "Slowly lift both hands"),
                Stage::new("Lower", 0.5, 0.8, "Slowly lower both hands"),
                Stage::new("Close", 0.8, 1.0, "Return to the starting position"),
            ],
        },
        Action {
            name: "Part the Wild Horse's Mane".to_string(),
            description: "Step out and brush the knee, bow stance with parting palms"
                .to_string(),
            duration_seconds: 8.0,
            keypoints: vec![
                KeypointSpec::new("left_knee", 160.0, 20.0),
                KeypointSpec::new("right_knee", 160.0, 20.0),
                KeypointSpec::new("left_hip", 90.0, 25.0),
                KeypointSpec::new("right_hip", 90.0, 25.0),
            ],
            stages: vec![
                Stage::new("Left Setup", 0.0, 0.25, "Shift weight to the right"),
                Stage::new("Left Bow Stance", 0.25, 0.5, "Step left, left hand brushes the knee"),
                Stage::new("Right Setup", 0.5, 0.75, "Shift weight to the left"),
                Stage::new(
                    "Right Bow Stance",
                    0.75,
                    1.0,
                    "Step right, right hand brushes the knee",
                ),
            ],
        },
        Action {
            name: "White Crane Spreads Its Wings".to_string(),
            description: "Lift the knee and show the palms, balance on one leg".to_string(),
            duration_seconds: 6.0,
            keypoints: vec![
                KeypointSpec::new("left_knee", 120.0, 25.0),
                KeypointSpec::new("right_knee", 90.0, 20.0),
                KeypointSpec::new("left_wrist", 180.0, 30.0),
                KeypointSpec::new("right_wrist", 180.0, 30.0),
            ],
            stages: vec![
                Stage::new("Transition", 0.0, 0.3, "Shift weight to the left"),
                Stage::new("Lift Knee", 0.3, 0.6, "Raise the right knee"),
                Stage::new("Spread Palms", 0.6, 0.85, "Open both palms"),
                Stage::new("Hold", 0.85, 1.0, "Hold the posture steady"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_action(name: &str) -> Action {
        Action {
            name: name.to_string(),
            description: "test".to_string(),
            duration_seconds: 4.0,
            keypoints: vec![KeypointSpec::new("left_elbow", 90.0, 10.0)],
            stages: vec![
                Stage::new("a", 0.0, 0.2, ""),
                Stage::new("b", 0.2, 0.5, ""),
                Stage::new("c", 0.5, 0.8, ""),
                Stage::new("d", 0.8, 1.0, ""),
            ],
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = ActionCatalog::builtin();
        let validated = ActionCatalog::new(builtin.iter().cloned().collect());
        assert!(validated.is_ok());
        assert_eq!(builtin.len(), 3);
        assert_eq!(builtin.first().name, "Commencement");
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = ActionCatalog::builtin();
        let action = catalog.get("White Crane Spreads Its Wings").unwrap();
        assert_eq!(action.keypoints.len(), 4);
        assert_eq!(action.duration_seconds, 6.0);
        assert!(catalog.get("Single Whip").is_none());
    }

    #[test]
    fn test_next_after() {
        let catalog = ActionCatalog::builtin();
        assert_eq!(
            catalog.next_after("Commencement").map(|a| a.name.as_str()),
            Some("Part the Wild Horse's Mane")
        );
        assert!(catalog.next_after("White Crane Spreads Its Wings").is_none());
        assert!(catalog.next_after("missing").is_none());
    }

    #[test]
    fn test_stage_lookup() {
        let action = sample_action("stages");
        assert_eq!(action.stage_at(0.15).map(|s| s.name.as_str()), Some("a"));
        assert_eq!(action.stage_at(0.2).map(|s| s.name.as_str()), Some("b"));
        assert_eq!(action.stage_at(0.99).map(|s| s.name.as_str()), Some("d"));
        assert!(action.stage_at(1.0).is_none());
        assert!(action.stage_at(-0.1).is_none());
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(matches!(
            ActionCatalog::new(vec![]),
            Err(EngineError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = ActionCatalog::new(vec![sample_action("x"), sample_action("x")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let mut action = sample_action("x");
        action.keypoints[0].tolerance = 0.0;
        assert!(ActionCatalog::new(vec![action]).is_err());
    }

    #[test]
    fn test_rejects_unwired_joint() {
        let mut action = sample_action("x");
        action.keypoints[0].name = "nose".to_string();
        assert!(ActionCatalog::new(vec![action]).is_err());

        let mut action = sample_action("y");
        action.keypoints[0].name = "tail".to_string();
        assert!(ActionCatalog::new(vec![action]).is_err());
    }

    #[test]
    fn test_rejects_stage_gap() {
        let mut action = sample_action("x");
        action.stages[1].progress = (0.25, 0.5);
        assert!(ActionCatalog::new(vec![action]).is_err());
    }

    #[test]
    fn test_rejects_stages_not_reaching_one() {
        let mut action = sample_action("x");
        action.stages[3].progress = (0.8, 0.9);
        assert!(ActionCatalog::new(vec![action]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let json = ActionCatalog::builtin().to_json().unwrap();
        let loaded = ActionCatalog::from_json(&json).unwrap();
        assert_eq!(loaded.names(), ActionCatalog::builtin().names());
    }
}
