//! Engine configuration
//!
//! Thresholds that callers may tune. The scoring curve breakpoints are fixed
//! and not part of the configuration.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Visibility below this confidence counts as "not visible"
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.3;

/// Aggregate score at or above which a snapshot extends the combo
pub const DEFAULT_COMBO_THRESHOLD: u8 = 70;

/// Number of recent scores kept by a session
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum landmark confidence (0-1)
    pub visibility_threshold: f64,
    /// Minimum aggregate score that counts towards the combo (0-100)
    pub combo_threshold: u8,
    /// Reset the combo whenever a snapshot scores below `combo_threshold`
    pub break_combo_on_miss: bool,
    /// Capacity of the session's score history
    pub history_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            combo_threshold: DEFAULT_COMBO_THRESHOLD,
            break_combo_on_miss: false,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "visibility_threshold must be within [0, 1], got {}",
                self.visibility_threshold
            )));
        }
        if self.combo_threshold > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "combo_threshold must be within [0, 100], got {}",
                self.combo_threshold
            )));
        }
        if self.history_window == 0 {
            return Err(EngineError::InvalidConfig(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
