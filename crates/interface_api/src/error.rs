//! API error handling
//!
//! Maps typed domain errors onto HTTP status codes with a consistent
//! JSON body. Conflicts (duplicate receipt, stale version, locked order)
//! are distinct from validation and state-precondition failures so
//! callers can apply the right recovery; internal details are logged,
//! never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_pricing::PricingError;
use domain_receipts::ReceiptError;
use domain_schedule::ScheduleError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        match &err {
            e if e.is_not_found() => ApiError::NotFound(err.to_string()),
            e if e.is_conflict() => ApiError::Conflict(err.to_string()),
            ReceiptError::MissingAircraftRecord(_) => ApiError::Internal(err.to_string()),
            ReceiptError::InvalidOrderStatus(_)
            | ReceiptError::DraftRequired(_)
            | ReceiptError::InvalidStateTransition { .. }
            | ReceiptError::UncalculatedFees
            | ReceiptError::MissingFuelQuantity
            | ReceiptError::MissingAircraftTypeSnapshot
            | ReceiptError::FeeNotManuallyWaivable(_)
            | ReceiptError::NotAFeeLine(_) => ApiError::BadRequest(err.to_string()),
            ReceiptError::Pricing(PricingError::Validation(_)) => {
                ApiError::BadRequest(err.to_string())
            }
            ReceiptError::Pricing(_) => ApiError::Internal(err.to_string()),
            ReceiptError::Port(port) => port_error(port),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match &err {
            ScheduleError::VersionNotFound(_) => ApiError::NotFound(err.to_string()),
            ScheduleError::Port(port) => port_error(port),
        }
    }
}

fn port_error(err: &PortError) -> ApiError {
    match err {
        PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        PortError::Validation { .. } => ApiError::BadRequest(err.to_string()),
        PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
        _ => ApiError::Internal(err.to_string()),
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
