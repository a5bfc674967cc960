use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use services::QuizError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InvalidConfiguration(_)
            | QuizError::InvalidStateTransition { .. }
            | QuizError::UnknownProblem { .. } => AppError::BadRequest(err.to_string()),
            QuizError::StorageUnavailable(inner) => AppError::from(inner),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<SqliteInitError> for AppError {
    fn from(err: SqliteInitError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
