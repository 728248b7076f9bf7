//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across the swap pipeline. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Design Philosophy
//!
//! - **Single Error Type**: Every pipeline stage reports failures as `AppError`
//! - **Stage Tagging**: Each error knows which [`SwapStage`] produced it
//! - **HTTP Mapping**: Errors map naturally to HTTP status codes
//! - **No Swallowing**: Stages never substitute defaults for failures
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`InvalidInput`](AppError::InvalidInput) → 400 Bad Request
//!    - [`PoolNotFound`](AppError::PoolNotFound) → 404 Not Found
//!
//! 2. **Transaction Errors** (400) - a submitted or prepared transaction failed
//!    - [`Allowance`](AppError::Allowance), [`Wrap`](AppError::Wrap), [`Execution`](AppError::Execution)
//!
//! 3. **Upstream Errors** (502)
//!    - [`Quote`](AppError::Quote) → simulation failed or returned nothing usable
//!    - [`LedgerUnavailable`](AppError::LedgerUnavailable) → node/provider failure at any stage
//!
//! 4. **Server Errors** (500)
//!    - [`Config`](AppError::Config), [`Internal`](AppError::Internal)
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result, SwapStage};
//!
//! fn check_pair(token_in: &str, token_out: &str) -> Result<()> {
//!     if token_in == token_out {
//!         return Err(AppError::InvalidInput("tokenIn and tokenOut must differ".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_pair("0xabc", "0xabc").unwrap_err();
//! assert_eq!(err.stage(), Some(SwapStage::Validation));
//! ```

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStage {
    /// Request parsing and amount conversion, before any ledger interaction
    Validation,
    /// Reading the current allowance
    Allowance,
    /// Wrapping native currency
    Wrap,
    /// Submitting/confirming the approval transaction
    Approval,
    /// Factory lookup and pool reads
    PoolResolution,
    /// Quoter simulation
    Quote,
    /// Building swap parameters from the quote
    ParamsBuild,
    /// Submitting/confirming the swap transaction
    Execution,
}

impl SwapStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStage::Validation => "validation",
            SwapStage::Allowance => "allowance",
            SwapStage::Wrap => "wrap",
            SwapStage::Approval => "approval",
            SwapStage::PoolResolution => "poolResolution",
            SwapStage::Quote => "quote",
            SwapStage::ParamsBuild => "paramsBuild",
            SwapStage::Execution => "execution",
        }
    }
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed amount or token descriptor, detected before any ledger interaction.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Allowance read (`stage: Allowance`) or approval submission/confirmation
    /// (`stage: Approval`) failed.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Allowance error: {message}")]
    Allowance { stage: SwapStage, message: String },

    /// Native currency wrap failed.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Wrap error: {0}")]
    Wrap(String),

    /// No pool exists for the pair at the configured fee tier.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    /// Quote simulation failed or returned no result (`stage: Quote`), or the
    /// quote could not be turned into swap parameters (`stage: ParamsBuild`).
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Quote error: {message}")]
    Quote { stage: SwapStage, message: String },

    /// Swap transaction submission or confirmation failed.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Execution error: {0}")]
    Execution(String),

    /// Network/provider failure, tagged with the stage it interrupted.
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Ledger unavailable during {stage}: {message}")]
    LedgerUnavailable { stage: SwapStage, message: String },

    /// Internal server error (unexpected failures).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stage this error is attributed to, if it belongs to the swap pipeline.
    pub fn stage(&self) -> Option<SwapStage> {
        match self {
            AppError::InvalidInput(_) => Some(SwapStage::Validation),
            AppError::Wrap(_) => Some(SwapStage::Wrap),
            AppError::PoolNotFound(_) => Some(SwapStage::PoolResolution),
            AppError::Execution(_) => Some(SwapStage::Execution),
            AppError::Allowance { stage, .. }
            | AppError::Quote { stage, .. }
            | AppError::LedgerUnavailable { stage, .. } => Some(*stage),
            AppError::Config(_) | AppError::Internal(_) => None,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PoolNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Allowance { .. } | AppError::Wrap(_) | AppError::Execution(_) => StatusCode::BAD_REQUEST,
            AppError::Quote { .. } | AppError::LedgerUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Allowance { .. } => "Allowance",
            AppError::Wrap(_) => "Wrap",
            AppError::PoolNotFound(_) => "PoolNotFound",
            AppError::Quote { .. } => "Quote",
            AppError::Execution(_) => "Execution",
            AppError::LedgerUnavailable { .. } => "LedgerUnavailable",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// Pipeline errors carry their root cause; configuration and internal errors
    /// return a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                tracing::debug!("Client error: {}", self);
            }
            _ => {
                tracing::error!("Server error: {}", self);
            }
        }

        let body = Json(json!({
            "error": self.user_message(),
            "code": self.code(),
            "stage": self.stage(),
        }));

        (status, body).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags() {
        assert_eq!(AppError::InvalidInput("x".into()).stage(), Some(SwapStage::Validation));
        assert_eq!(AppError::PoolNotFound("x".into()).stage(), Some(SwapStage::PoolResolution));
        let err = AppError::Allowance { stage: SwapStage::Approval, message: "reverted".into() };
        assert_eq!(err.stage(), Some(SwapStage::Approval));
        let err = AppError::Quote { stage: SwapStage::ParamsBuild, message: "expired".into() };
        assert_eq!(err.stage(), Some(SwapStage::ParamsBuild));
        let err = AppError::LedgerUnavailable { stage: SwapStage::Quote, message: "down".into() };
        assert_eq!(err.stage(), Some(SwapStage::Quote));
        assert_eq!(AppError::Config("x".into()).stage(), None);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PoolNotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        let err = AppError::Quote { stage: SwapStage::Quote, message: "x".into() };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("stack trace here".into());
        assert_eq!(err.user_message(), "An internal error occurred");

        let err = AppError::Execution("transaction 0x01 reverted".into());
        assert_eq!(err.user_message(), "Execution error: transaction 0x01 reverted");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let err = AppError::LedgerUnavailable { stage: SwapStage::Approval, message: "timeout".into() };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "LedgerUnavailable");
        assert_eq!(json["stage"], "approval");
    }
}
