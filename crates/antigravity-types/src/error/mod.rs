//! Typed error definitions for the Antigravity gateway.
//!
//! This module provides the gateway error taxonomy. All errors are designed
//! to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for retry/rotation logic via enum variants
//! - **Composable** via thiserror derive macros
//!
//! The dispatcher's recovery policy keys off these variants: `RateLimited`
//! and auth-class errors are recovered by rotating accounts, while
//! `QuotaExhausted` and `NoAccounts` are surfaced to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all gateway operations.
///
/// Each variant preserves the HTTP status observed at the point of failure so
/// that downstream classification does not have to fall back to substring
/// matching on the error text.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "details")]
pub enum GatewayError {
    /// OAuth user-info or token-exchange failure. Signals "re-authenticate".
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Refresh token rejected. Signals "mark the account invalid", not
    /// merely cooled down.
    #[error("Invalid credentials ({status}): {message}")]
    InvalidCredentials { status: u16, message: String },

    /// Upstream returned 429. Signals "record the cooldown and rotate".
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Cooldown parsed from the response body, when present.
        reset_ms: Option<u64>,
    },

    /// Every account is limited and the minimum wait exceeds the threshold.
    /// Terminal for this (model, moment).
    #[error("All accounts rate-limited for {model}, wait {wait_ms}ms")]
    QuotaExhausted { model: String, wait_ms: u64 },

    /// The pool is empty or every account is invalid.
    #[error("No accounts available: {message}")]
    NoAccounts { message: String },

    /// 4xx/5xx not otherwise classified.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Account storage/filesystem error.
    #[error("Account storage error: {message}")]
    Storage { message: String },
}

impl GatewayError {
    /// HTTP-ish status code for surfacing this error to a caller.
    pub fn status(&self) -> u16 {
        match self {
            Self::Auth { status, .. }
            | Self::InvalidCredentials { status, .. }
            | Self::Upstream { status, .. } => *status,
            Self::RateLimited { .. } | Self::QuotaExhausted { .. } => 429,
            Self::NoAccounts { .. } => 503,
            Self::Storage { .. } => 500,
        }
    }

    /// Check if this error should invalidate the account it occurred on.
    pub fn should_invalidate_account(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::InvalidCredentials { .. })
    }

    /// Check if this is a transient error that may resolve on rotation.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Standard Result type using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
