//! API Error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use fuel_core::error::LedgerError;
use fuel_core::types::PeriodKind;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid referral code: {0}")]
    InvalidCode(String),

    #[error("User already referred")]
    AlreadyReferred,

    #[error("Self-referral is not allowed")]
    SelfReferral,

    #[error("{period} cap reached: {current}/{max}")]
    CapReached {
        period: PeriodKind,
        current: u32,
        max: u32,
    },

    #[error("User disabled: {0}")]
    UserDisabled(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::InvalidAction(_) => (StatusCode::BAD_REQUEST, "INVALID_ACTION", None),
            ApiError::InvalidCode(_) => (StatusCode::BAD_REQUEST, "INVALID_CODE", None),
            ApiError::AlreadyReferred => (StatusCode::CONFLICT, "ALREADY_REFERRED", None),
            ApiError::SelfReferral => (StatusCode::CONFLICT, "SELF_REFERRAL", None),
            ApiError::CapReached {
                period,
                current,
                max,
            } => (
                StatusCode::CONFLICT,
                "CAP_REACHED",
                Some(serde_json::json!({
                    "period": period,
                    "current": current,
                    "max": max,
                })),
            ),
            ApiError::UserDisabled(_) => (StatusCode::CONFLICT, "USER_DISABLED", None),
            ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidAction(action) => ApiError::InvalidAction(action),
            LedgerError::InvalidAmount(_) => ApiError::BadRequest(e.to_string()),
            LedgerError::UserNotFound(user) => {
                ApiError::NotFound(format!("User {} not found", user))
            }
            LedgerError::UserDisabled(user) => ApiError::UserDisabled(user),
            LedgerError::BalanceUnderflow { .. }
            | LedgerError::IntegrityMismatch { .. }
            | LedgerError::Storage(_)
            | LedgerError::Serialization(_) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
