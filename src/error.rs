use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Service error taxonomy. Every fallible path funnels into one of these
/// so route handlers can return `Result<T>` directly.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete input (400)
    #[error("invalid input: {0}")]
    Validation(String),

    /// Missing submission, profile or reviewer (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not legal in the queue's current state (409)
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Skip-the-line without an acceptable payment proof (402)
    #[error("payment required: {0}")]
    PaymentRequired(String),

    /// Database error (500)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error (500)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Error::InvalidOperation(msg) => (StatusCode::CONFLICT, "INVALID_OPERATION", msg),
            Error::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED", msg),
            Error::Database(ref err) => {
                tracing::error!("database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE",
                    err.to_string(),
                )
            }
            Error::Io(ref err) => {
                tracing::error!("io error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO", err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
