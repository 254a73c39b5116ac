use thiserror::Error;

use crate::scoring::ExerciseKind;

pub type ScoringResult<T> = std::result::Result<T, ScoringError>;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("unknown exercise type: {0}")]
    UnknownKind(String),
    #[error("invalid {kind} content: {reason}")]
    InvalidContent { kind: ExerciseKind, reason: String },
    #[error("invalid {kind} submission: {reason}")]
    InvalidSubmission { kind: ExerciseKind, reason: String },
    #[error("unable to build word search grid: {0}")]
    GridGeneration(String),
}

impl ScoringError {
    pub fn content<S: Into<String>>(kind: ExerciseKind, reason: S) -> Self {
        Self::InvalidContent {
            kind,
            reason: reason.into(),
        }
    }

    pub fn submission<S: Into<String>>(kind: ExerciseKind, reason: S) -> Self {
        Self::InvalidSubmission {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn content_json(kind: ExerciseKind, error: serde_json::Error) -> Self {
        Self::content(kind, error.to_string())
    }

    pub(crate) fn submission_json(kind: ExerciseKind, error: serde_json::Error) -> Self {
        Self::submission(kind, error.to_string())
    }
}
