//! Error types for grading, classification and record storage.
//!
//! Protocol violations and classifier failures are typed so the request
//! layer can tell "restart the attempt" apart from "prediction unavailable"
//! without string matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised when a submission cannot be graded.
///
/// Malformed answers are never errors; they grade as wrong or blank.
#[derive(Debug, Error)]
pub enum GradeError {
    /// No open attempt matches the submission (never started, already
    /// submitted, or belonging to another user).
    #[error("no active attempt {attempt_id}; start the test again")]
    NoActiveAttempt { attempt_id: Uuid },

    /// The attempt was opened too long ago to be graded.
    #[error("attempt {attempt_id} expired; start the test again")]
    AttemptExpired { attempt_id: Uuid },
}

/// Errors raised by the risk classifier.
///
/// Every variant is fatal for the prediction call: there is no fallback
/// label.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model artifact could not be read from disk.
    #[error("model artifact unreadable at {path}: {message}")]
    ArtifactUnreadable { path: String, message: String },

    /// The model artifact was read but could not be decoded.
    #[error("model artifact invalid at {path}: {message}")]
    ArtifactInvalid { path: String, message: String },

    /// `predict` was called before `load`.
    #[error("model not loaded")]
    NotLoaded,

    /// The feature vector length does not match the model's weights.
    #[error("feature vector has {got} values, model expects {expected}")]
    FeatureMismatch { expected: usize, got: usize },

    /// The model returned an empty or non-finite output.
    #[error("model returned an invalid output: {0}")]
    InvalidOutput(String),
}

/// Errors raised by record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the given id was not found for the user.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    /// The backing store failed (poisoned lock, I/O).
    #[error("store backend error: {0}")]
    Backend(String),

    /// Records could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by the screening engine.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Grade(#[from] GradeError),

    #[error("prediction unavailable: {0}")]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Intake data failed validation.
    #[error("invalid intake: {0}")]
    InvalidIntake(String),

    /// The user has no demographic intake to predict from.
    #[error("no intake recorded for user {0}")]
    NoIntake(String),
}

impl ScreeningError {
    /// Returns `true` if the caller should restart the attempt.
    pub fn requires_restart(&self) -> bool {
        matches!(self, ScreeningError::Grade(_))
    }

    /// Returns `true` if the failure came from the classifier.
    pub fn is_prediction_unavailable(&self) -> bool {
        matches!(self, ScreeningError::Classifier(_))
    }
}
