//! Practice session tracking
//!
//! A [`SessionTracker`] owns the mutable state of one practice session and is
//! its only writer. It evaluates incoming snapshots against the current
//! action, keeps score, feedback and combo, and moves through the phases
//! `idle → ready → playing → completed`.

use crate::catalog::ActionCatalog;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::history::ScoreHistory;
use crate::pose::PoseEvaluator;
use crate::types::{Action, PoseEvaluation, PoseSnapshot, Stage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Ready,
    Playing,
    Completed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Ready => "ready",
            SessionPhase::Playing => "playing",
            SessionPhase::Completed => "completed",
        }
    }

    /// Whether incoming snapshots are scored in this phase
    pub fn is_evaluating(&self) -> bool {
        matches!(self, SessionPhase::Ready | SessionPhase::Playing)
    }
}

/// Observable state of a practice session
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: String,
    pub current_pose: Option<PoseSnapshot>,
    pub previous_pose: Option<PoseSnapshot>,
    pub current_action: Option<String>,
    /// Progress through the current action (0-1), driven externally
    pub action_progress: f64,
    /// Latest aggregate score (0-100)
    pub score: u8,
    pub feedback: String,
    pub combo_count: u32,
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluation: Option<PoseEvaluation>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            current_pose: None,
            previous_pose: None,
            current_action: None,
            action_progress: 0.0,
            score: 0,
            feedback: String::new(),
            combo_count: 0,
            phase: SessionPhase::Idle,
            last_evaluation: None,
        }
    }
}

/// Single-writer tracker for one practice session.
///
/// The catalog is borrowed read-only and must outlive the session.
pub struct SessionTracker<'c> {
    catalog: &'c ActionCatalog,
    config: EngineConfig,
    evaluator: PoseEvaluator,
    history: ScoreHistory,
    state: SessionState,
}

impl SessionTracker<'static> {
    /// Session over the built-in catalog with default settings
    pub fn with_builtin_catalog() -> Self {
        Self::new(ActionCatalog::builtin())
    }
}

impl<'c> SessionTracker<'c> {
    pub fn new(catalog: &'c ActionCatalog) -> Self {
        Self::build(catalog, EngineConfig::default())
    }

    /// Create a session with a validated configuration
    pub fn with_config(
        catalog: &'c ActionCatalog,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::build(catalog, config))
    }

    fn build(catalog: &'c ActionCatalog, config: EngineConfig) -> Self {
        Self {
            catalog,
            evaluator: PoseEvaluator::new(config.visibility_threshold),
            history: ScoreHistory::new(config.history_window),
            config,
            state: SessionState::new(),
        }
    }

    /// Move from `idle` to `ready` on the first catalog action
    pub fn start(&mut self) {
        if self.state.phase != SessionPhase::Idle {
            debug!(phase = self.state.phase.as_str(), "start ignored, session already running");
            return;
        }
        let first = self.catalog.first();
        self.state.current_action = Some(first.name.clone());
        self.state.action_progress = 0.0;
        self.transition(SessionPhase::Ready);
    }

    /// Return to `idle` from any phase
    pub fn stop(&mut self) {
        self.transition(SessionPhase::Idle);
    }

    /// Make `name` the current action and rewind progress.
    ///
    /// Unknown names leave the session untouched.
    pub fn select_action(&mut self, name: &str) -> Result<&'c Action, EngineError> {
        let catalog = self.catalog;
        let action = match catalog.get(name) {
            Some(action) => action,
            None => {
                warn!(action = name, "unknown action requested");
                return Err(EngineError::UnknownAction(name.to_string()));
            }
        };
        self.enter_action(action);
        Ok(action)
    }

    /// Select the catalog action after the current one, if there is one
    pub fn advance_action(&mut self) -> Option<&'c Action> {
        let catalog = self.catalog;
        let next = match self.state.current_action.as_deref() {
            Some(current) => catalog.next_after(current)?,
            None => catalog.first(),
        };
        self.enter_action(next);
        Some(next)
    }

    fn enter_action(&mut self, action: &Action) {
        info!(action = %action.name, "action selected");
        self.state.current_action = Some(action.name.clone());
        self.state.action_progress = 0.0;
        if matches!(self.state.phase, SessionPhase::Playing | SessionPhase::Completed) {
            self.transition(SessionPhase::Ready);
        }
    }

    /// Update progress through the current action (clamped to `[0, 1]`)
    pub fn set_progress(&mut self, progress: f64) {
        if !progress.is_finite() {
            warn!(progress, "ignoring non-finite progress");
            return;
        }
        let progress = progress.clamp(0.0, 1.0);
        self.state.action_progress = progress;

        match self.state.phase {
            SessionPhase::Ready if progress > 0.0 => {
                self.transition(SessionPhase::Playing);
                if progress >= 1.0 {
                    self.transition(SessionPhase::Completed);
                }
            }
            SessionPhase::Playing if progress >= 1.0 => self.transition(SessionPhase::Completed),
            _ => {}
        }
    }

    /// Record a new snapshot and, while ready or playing, score it.
    pub fn ingest_snapshot(&mut self, pose: PoseSnapshot) -> Option<PoseEvaluation> {
        self.state.previous_pose = self.state.current_pose.replace(pose);

        if !self.state.phase.is_evaluating() {
            return None;
        }

        let action = self.current_action()?;
        let pose = self.state.current_pose.as_ref()?;
        let evaluation = self.evaluator.evaluate(pose, action);

        debug!(
            action = %action.name,
            score = evaluation.score,
            progress = self.state.action_progress,
            "snapshot evaluated"
        );

        self.state.score = evaluation.score;
        self.state.feedback = evaluation.feedback.clone();
        self.history.push(evaluation.score);

        if evaluation.score >= self.config.combo_threshold {
            self.state.combo_count += 1;
        } else if self.config.break_combo_on_miss && self.state.combo_count > 0 {
            debug!(combo = self.state.combo_count, "combo broken");
            self.state.combo_count = 0;
        }

        self.state.last_evaluation = Some(evaluation.clone());
        Some(evaluation)
    }

    pub fn reset_combo(&mut self) {
        self.state.combo_count = 0;
    }

    fn transition(&mut self, phase: SessionPhase) {
        if self.state.phase != phase {
            info!(from = self.state.phase.as_str(), to = phase.as_str(), "session phase changed");
            self.state.phase = phase;
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// The current action, if one is selected and present in the catalog
    pub fn current_action(&self) -> Option<&'c Action> {
        let catalog = self.catalog;
        self.state
            .current_action
            .as_deref()
            .and_then(|name| catalog.get(name))
    }

    /// Stage of the current action at the current progress
    pub fn current_stage(&self) -> Option<&'c Stage> {
        self.current_action()?.stage_at(self.state.action_progress)
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'c ActionCatalog {
        self.catalog
    }
}
