//! Error handling for the Bakehouse Inventory Platform
//!
//! Domain errors are recovered at the HTTP boundary and turned into
//! structured JSON responses; fatal errors surface with minimal detail and
//! are logged with full context.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use shared::Shortage;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for {} ingredient(s)", .0.len())]
    InsufficientStock(Vec<Shortage>),

    /// The FIFO walk could not cover an amount the sufficiency check
    /// approved. Signals a concurrency or data defect, not user error.
    #[error("stock consistency violation for ingredient {ingredient_id}: {remaining} of {requested} undeducted")]
    StockConsistency {
        ingredient_id: Uuid,
        requested: Decimal,
        remaining: Decimal,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortages: Option<Vec<Shortage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            shortages: None,
            error: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    field: Some(field.clone()),
                    ..ErrorResponse::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    field: Some(field.clone()),
                    ..ErrorResponse::new(
                        "DUPLICATE_ENTRY",
                        format!("A record with this {} already exists", field),
                    )
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock(shortages) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    shortages: Some(shortages.clone()),
                    ..ErrorResponse::new("INSUFFICIENT_STOCK", "Insufficient stock".to_string())
                },
            ),
            AppError::StockConsistency { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: Some("stock consistency violation".to_string()),
                    ..ErrorResponse::new(
                        "STOCK_CONSISTENCY",
                        "An internal stock consistency error occurred".to_string(),
                    )
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: Some("database error".to_string()),
                    ..ErrorResponse::new("DATABASE_ERROR", "A database error occurred".to_string())
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: Some(msg.clone()),
                    ..ErrorResponse::new(
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                    )
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        };

        // Consistency violations signal a bug, not a user mistake
        match &self {
            AppError::StockConsistency { .. } => tracing::error!("Error: {:?}", self),
            AppError::DatabaseError(_) | AppError::InternalError(_) | AppError::Internal(_) => {
                tracing::error!("Error: {:?}", self)
            }
            _ => tracing::debug!("Error: {:?}", self),
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
