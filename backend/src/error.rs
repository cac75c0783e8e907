//! Error handling for the Retail Management Platform
//!
//! Every error carries a stable machine-readable code and a human-readable
//! message, so API clients can react without parsing message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Insufficient stock in batch {batch_number}: requested {requested}, remaining {remaining}")]
    InsufficientBatchStock {
        batch_number: String,
        requested: i32,
        remaining: i32,
    },

    #[error("Insufficient inventory for product {product}: {missing} more units needed")]
    InsufficientInventory { product: String, missing: i32 },

    #[error("Inventory for shop {shop_id}, product {product_id} would go negative ({current} {delta:+})")]
    NegativeInventory {
        shop_id: Uuid,
        product_id: Uuid,
        current: i32,
        delta: i32,
    },

    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    #[error("Unable to allocate a unique invoice number")]
    InvoiceNumberExhausted,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = first_field_error(&errors)
            .unwrap_or_else(|| ("request".to_string(), "Invalid request".to_string()));
        AppError::Validation { field, message }
    }
}

// The response surface reports one field at a time, so surface the first
// failed check, descending into nested structs and lists.
fn first_field_error(errors: &validator::ValidationErrors) -> Option<(String, String)> {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field));
                    return Some((field.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_field_error(nested) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    if let Some(found) = first_field_error(nested) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "Invalid email or password".to_string(),
                    field: None,
                },
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "TOKEN_EXPIRED".to_string(),
                    message: "Token has expired".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_TOKEN".to_string(),
                    message: "Invalid token".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DuplicateEntry(resource) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", resource),
                    field: Some(resource.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InsufficientBatchStock { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_BATCH_STOCK".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::InsufficientInventory { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_INVENTORY".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::NegativeInventory { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NEGATIVE_INVENTORY".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::LedgerInconsistency(msg) => (
                // A data-integrity bug, not a user error. Requires manual
                // reconciliation; never auto-corrected.
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "LEDGER_INCONSISTENCY".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InvoiceNumberExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "INVOICE_NUMBER_EXHAUSTED".to_string(),
                    message: "Unable to generate a unique invoice number after maximum attempts"
                        .to_string(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
