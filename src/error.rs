use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failure of a single remote catalog request
///
/// Cloneable so that one shared in-flight request can hand the same failure
/// to every caller waiting on it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{operation} request failed: {message}")]
pub struct RemoteFetchError {
    /// Human-readable operation name, e.g. "top rated movies"
    pub operation: String,
    /// HTTP status, when the service answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteFetchError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        format!("Failed to load {}", self.operation)
    }
}

/// Errors from the key-value storage backends
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    RemoteFetch(#[from] RemoteFetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a remote 404 onto a not-found condition, leaving other failures as they are
    pub fn not_found_or_remote(err: RemoteFetchError, what: impl Into<String>) -> Self {
        if err.is_not_found() {
            AppError::NotFound(what.into())
        } else {
            AppError::RemoteFetch(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RemoteFetch(ref err) => {
                tracing::error!(
                    operation = %err.operation,
                    status = ?err.status,
                    error = %err.message,
                    "Remote catalog request failed"
                );
                (StatusCode::BAD_GATEWAY, err.user_message())
            }
            AppError::Storage(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_fetch_error_user_message() {
        let err = RemoteFetchError::new("top rated movies", "connection refused");
        assert_eq!(err.user_message(), "Failed to load top rated movies");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_remote_fetch_error_not_found() {
        let err = RemoteFetchError::new("movie details", "missing").with_status(404);
        assert!(err.is_not_found());

        match AppError::not_found_or_remote(err, "Movie 42") {
            AppError::NotFound(what) => assert_eq!(what, "Movie 42"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_fetch_error_passes_through_other_statuses() {
        let err = RemoteFetchError::new("movie details", "boom").with_status(500);
        assert!(matches!(
            AppError::not_found_or_remote(err, "Movie 42"),
            AppError::RemoteFetch(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::RemoteFetch(RemoteFetchError::new("genres", "x")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
