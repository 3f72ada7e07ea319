//! Error types for Taiji Form

use thiserror::Error;

/// Errors that can occur outside the scoring path.
///
/// Scoring itself never fails: low-confidence landmarks and unreadable
/// geometry degrade to a zero score. These variants cover input parsing,
/// reference-data validation and catalog lookups.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid pose snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid action catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
