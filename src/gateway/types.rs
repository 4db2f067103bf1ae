//! API boundary types
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError` / `ApiResult<T>`: handler error plumbing
//! - `error_codes`: Standard error code constants
//! - Request DTOs with field validation

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::validation::validate_currency_code;
use crate::transfer::{StoreError, TransferError};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const CURRENCY_MISMATCH: i32 = 1003;
    pub const CONSTRAINT_VIOLATION: i32 = 1004;
    pub const BALANCE_OUT_OF_RANGE: i32 = 1005;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const TRANSFER_NOT_FOUND: i32 = 4002;
    pub const CONFLICT: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Handler Errors
// ============================================================================

/// Error returned by handlers, rendered as an `ApiResponse` with no data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn not_found(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<crate::account::ValidationError> for ApiError {
    fn from(e: crate::account::ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::not_found(error_codes::ACCOUNT_NOT_FOUND, "not found"),
            StoreError::ConstraintViolation(msg) => {
                Self::new(StatusCode::FORBIDDEN, error_codes::CONSTRAINT_VIOLATION, msg)
            }
            StoreError::Conflict(msg) => {
                Self::new(StatusCode::CONFLICT, error_codes::CONFLICT, msg)
            }
            StoreError::OutOfRange(msg) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                error_codes::BALANCE_OUT_OF_RANGE,
                msg,
            ),
            StoreError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                Self::service_unavailable("storage unavailable")
            }
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let code = match &e {
            TransferError::InvalidArgument(_) => error_codes::INVALID_PARAMETER,
            TransferError::AccountNotFound(_) => error_codes::ACCOUNT_NOT_FOUND,
            TransferError::InsufficientFunds { .. } => error_codes::INSUFFICIENT_BALANCE,
            TransferError::Conflict { .. } => error_codes::CONFLICT,
            TransferError::BalanceOutOfRange(_) => error_codes::BALANCE_OUT_OF_RANGE,
            TransferError::StoreUnavailable(detail) => {
                // Driver text can carry hosts and credentials; keep it in the log
                tracing::error!(error = %detail, "Transfer store unavailable");
                return Self::service_unavailable("storage unavailable");
            }
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, e.to_string())
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// POST /api/v1/accounts
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 64))]
    pub owner: String,
    #[validate(custom(function = "validate_currency_code"))]
    pub currency: String,
}

/// GET /api/v1/accounts
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListAccountsRequest {
    pub owner: Option<String>,
    #[validate(range(min = 1))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl ListAccountsRequest {
    pub fn offset(&self) -> i64 {
        (self.page_id - 1).saturating_mul(self.page_size)
    }
}

/// POST /api/v1/transfers
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: i64,
    #[validate(range(min = 1))]
    pub to_account_id: i64,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(custom(function = "validate_currency_code"))]
    pub currency: String,
}
