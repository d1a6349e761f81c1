// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::ledger::LedgerError;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    StorageError(String),
    NotFound(String),
    ValidationError(String),
    InsufficientStock(String),
    Conflict(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Database error occurred".to_string(),
                )
            }
            AppError::StorageError(detail) => {
                tracing::error!(%detail, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Database error occurred".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            AppError::InsufficientStock(msg) => (StatusCode::BAD_REQUEST, "insufficient_stock", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => AppError::ValidationError(msg),
            LedgerError::NotFound(msg) => AppError::NotFound(msg),
            e @ LedgerError::InsufficientStock { .. } => AppError::InsufficientStock(e.to_string()),
            e @ (LedgerError::TransientStorage(_) | LedgerError::Storage(_)) => {
                AppError::StorageError(e.to_string())
            }
        }
    }
}
