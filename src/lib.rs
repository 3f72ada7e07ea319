//! Taiji Form - On-device scoring engine for Tai Chi posture practice
//!
//! Taiji Form turns a stream of body landmark snapshots into a stream of
//! evaluation results through a deterministic pipeline: joint wiring → angle
//! measurement → per-keypoint scoring → pose aggregation → session bookkeeping
//! (score, feedback, combo, stage progress).
//!
//! Landmark detection is not part of this crate; snapshots arrive as 33
//! normalized keypoints from an upstream detector.
//!
//! ## Modules
//!
//! - **Evaluation**: [`geometry`], [`wiring`], [`keypoint`], [`pose`]
//! - **Reference data**: [`landmarks`], [`catalog`]
//! - **Sessions**: [`session`], [`history`], [`stream`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod keypoint;
pub mod landmarks;
pub mod pose;
pub mod session;
pub mod stream;
pub mod types;
pub mod wiring;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use catalog::ActionCatalog;
pub use config::EngineConfig;
pub use error::EngineError;
pub use geometry::{angle_at, body_center};
pub use keypoint::{evaluate_keypoint, KeypointEvaluator};
pub use landmarks::{BodyLandmark, LANDMARK_COUNT};
pub use pose::{evaluate_pose, PoseEvaluator};
pub use session::{SessionPhase, SessionState, SessionTracker};
pub use stream::{EvaluationRecord, SnapshotRecord, TimelineDriver};
pub use types::{
    Action, KeypointEvaluation, KeypointSpec, KeypointStatus, Landmark, PoseEvaluation,
    PoseSnapshot, Stage,
};

/// Library version
pub const TAIJI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "taiji-form";
