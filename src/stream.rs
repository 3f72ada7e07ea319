//! Snapshot streams
//!
//! Timestamped snapshot records as produced by an upstream landmark detector,
//! and a timeline driver that feeds them into a session. The driver derives
//! action progress from elapsed time, so the session itself never reads a clock.

use crate::error::EngineError;
use crate::session::{SessionPhase, SessionTracker};
use crate::types::{KeypointEvaluation, PoseSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A timestamped pose snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Capture time of the frame
    pub timestamp: DateTime<Utc>,
    /// Exactly 33 landmarks in canonical order
    pub landmarks: PoseSnapshot,
    /// Explicit progress (0-1); derived from elapsed time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl SnapshotRecord {
    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<SnapshotRecord>, EngineError> {
        let records: Vec<SnapshotRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line, blank lines skipped)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SnapshotRecord>, EngineError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record = Self::parse_line(trimmed).map_err(|e| {
                EngineError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn parse_line(line: &str) -> Result<SnapshotRecord, EngineError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Session output for one ingested record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub timestamp: DateTime<Utc>,
    pub action: Option<String>,
    pub stage: Option<String>,
    pub progress: f64,
    pub phase: SessionPhase,
    /// Present only when the snapshot was scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub combo: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<KeypointEvaluation>,
}

/// Feeds timestamped records into a session, driving progress from elapsed time
pub struct TimelineDriver<'c> {
    session: SessionTracker<'c>,
    auto_advance: bool,
    action_started_at: Option<DateTime<Utc>>,
    last_action: Option<String>,
}

impl<'c> TimelineDriver<'c> {
    /// Wrap a session, starting it if it is idle
    pub fn new(mut session: SessionTracker<'c>) -> Self {
        session.start();
        Self {
            session,
            auto_advance: false,
            action_started_at: None,
            last_action: None,
        }
    }

    /// Move on to the next catalog action whenever one completes
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Apply one record: update progress, ingest the snapshot, report the result
    pub fn process(&mut self, record: SnapshotRecord) -> EvaluationRecord {
        self.rewind_on_action_change(record.timestamp);

        let progress = match record.progress {
            Some(progress) => progress,
            None => self.elapsed_progress(record.timestamp),
        };
        self.session.set_progress(progress);

        // Stage is read before completion can advance the action
        let stage = self.session.current_stage().map(|s| s.name.clone());
        let action = self.session.state().current_action.clone();
        let progress = self.session.state().action_progress;
        let evaluation = self.session.ingest_snapshot(record.landmarks);
        let phase = self.session.phase();

        if self.auto_advance && phase == SessionPhase::Completed {
            if let Some(next) = self.session.advance_action() {
                info!(action = %next.name, "advancing to next action");
                self.action_started_at = Some(record.timestamp);
                self.last_action = Some(next.name.clone());
            }
        }

        let (score, feedback, details) = match evaluation {
            Some(eval) => (Some(eval.score), Some(eval.feedback), eval.details),
            None => (None, None, Vec::new()),
        };

        EvaluationRecord {
            timestamp: record.timestamp,
            action,
            stage,
            progress,
            phase,
            score,
            feedback,
            combo: self.session.state().combo_count,
            details,
        }
    }

    /// Process a batch of records in order
    pub fn process_all(&mut self, records: Vec<SnapshotRecord>) -> Vec<EvaluationRecord> {
        records.into_iter().map(|r| self.process(r)).collect()
    }

    fn rewind_on_action_change(&mut self, timestamp: DateTime<Utc>) {
        let current = self.session.state().current_action.clone();
        if current != self.last_action || self.action_started_at.is_none() {
            self.action_started_at = Some(timestamp);
            self.last_action = current;
        }
    }

    fn elapsed_progress(&self, timestamp: DateTime<Utc>) -> f64 {
        let (started_at, action) =
            match (self.action_started_at, self.session.current_action()) {
                (Some(started_at), Some(action)) => (started_at, action),
                _ => return 0.0,
            };
        let elapsed = (timestamp - started_at).num_milliseconds() as f64 / 1000.0;
        elapsed / action.duration_seconds
    }

    pub fn session(&self) -> &SessionTracker<'c> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionTracker<'c> {
        &mut self.session
    }

    pub fn into_session(self) -> SessionTracker<'c> {
        self.session
    }
}
