//! VaultSync B2 - Backblaze B2 native API client
//!
//! Provides async client for:
//! - Account authorization with application keys
//! - Paged bucket listings and per-name version listings
//! - Single-request uploads carrying a SHA-256 fingerprint in file info
//! - Downloads by file name and per-version deletes
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the B2 API with 429/503 retry
//! - [`types`] - Wire request/response types
//! - [`provider`] - [`IRemoteStore`](vaultsync_core::ports::IRemoteStore) implementation
//! - [`credentials`] - Application key storage in the system keyring

pub mod client;
pub mod credentials;
pub mod provider;
pub mod types;

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ErrorBody;

/// Errors that can occur when communicating with the B2 API
#[derive(Debug, Error)]
pub enum B2Error {
    /// Credentials are invalid or the token has expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The key lacks a capability or a cap was exceeded
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested file or bucket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// The service is temporarily unavailable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other server-side error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl B2Error {
    /// Classify a non-success response from its status and raw body
    pub fn from_response(status: StatusCode, body: &str, retry_after: Duration) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(err) => format!("{}: {}", err.code, err.message),
            Err(_) if body.trim().is_empty() => status.to_string(),
            Err(_) => body.trim().to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests { retry_after },
            StatusCode::SERVICE_UNAVAILABLE => Self::ServiceUnavailable(message),
            s if s.is_server_error() => Self::ServerError(message),
            _ => Self::BadRequest(message),
        }
    }

    /// Returns true if repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TooManyRequests { .. }
                | Self::ServiceUnavailable(_)
                | Self::ServerError(_)
                | Self::NetworkError(_)
        )
    }
}
