//! API error taxonomy
//!
//! Every fallible operation in the crate returns `ApiResult<T>`. Handlers and
//! the session manager surface exactly one of these kinds per failure; storage
//! and crypto errors are captured as `Internal` and never leak detail to the
//! client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input - the caller's fault.
    #[error("{0}")]
    Validation(String),
    /// Uniqueness violation (email or username already taken).
    #[error("{0}")]
    Conflict(String),
    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Bad credentials or bad/expired/rotated token.
    #[error("{0}")]
    Unauthorized(String),
    /// Unexpected storage or crypto failure. Detail is logged, not returned.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // Unique index violations surface as a conflict; the directory enforces
        // email/username uniqueness at the storage layer.
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return ApiError::Conflict("user already exists".to_string());
            }
        }
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(ref inner) = self {
            tracing::error!(error = ?inner, "internal error while handling request");
        }

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
            "success": false,
            "errors": [self.to_string()],
        }));

        (status, body).into_response()
    }
}
