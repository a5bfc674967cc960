//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::GeneratorError;
use drill_core::model::{ProblemKey, QuizSettingsError, QuizSummaryError};
use storage::repository::StorageError;

use crate::quiz::QuizState;

/// Errors emitted by quiz and performance services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("invalid quiz configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot {operation} while the quiz is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: QuizState,
    },

    #[error("could not draw a new problem: {0}")]
    GenerationExhausted(#[source] GeneratorError),

    #[error("problem {key} is outside the configured range")]
    UnknownProblem { key: ProblemKey },

    #[error(transparent)]
    Summary(#[from] QuizSummaryError),

    #[error("performance store unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl From<QuizSettingsError> for QuizError {
    fn from(err: QuizSettingsError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}

impl From<GeneratorError> for QuizError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::InvalidRange { .. } => Self::InvalidConfiguration(err.to_string()),
            _ => Self::GenerationExhausted(err),
        }
    }
}
