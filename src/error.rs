//! Application error taxonomy and its HTTP mapping.
//!
//! Services raise typed errors; a single `IntoResponse` impl maps them to the
//! JSON error envelope, so handlers just propagate with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::InvalidEnumValue;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// A referenced entity (or a parent in a nested route) does not resolve.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An invariant enforced in application code was violated.
    #[error("{0}")]
    BadRequest(String),

    /// Malformed input rejected before the service layer runs.
    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<InvalidEnumValue> for AppError {
    fn from(err: InvalidEnumValue) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            // Unique-index violations surface from races the application
            // already rejects up front (duplicate assignment, case number).
            AppError::Database(e) if is_unique_violation(e) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) if status == StatusCode::BAD_REQUEST => {
                warn!("unique constraint violated: {}", e);
                "duplicate value violates a uniqueness constraint".to_string()
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                "internal server error".to_string()
            }
            AppError::Storage(e) => {
                error!("storage error: {}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AppError::NotFound("case").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("duplicate role".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation("invalid status".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn enum_parse_errors_become_validation() {
        let err: AppError = "nope".parse::<crate::models::CaseStatus>().unwrap_err().into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
