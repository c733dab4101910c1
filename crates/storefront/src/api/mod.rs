//! REST client for the BBHCBazaar backend.
//!
//! # Architecture
//!
//! - JSON over HTTP via `reqwest`, every path under `/api`
//! - Bearer token from the [`Session`](crate::session::Session) on every request
//! - A 401 triggers one transparent token refresh and a single retry
//! - Wire payloads are normalized into [`types`] exactly once, in `conversions`
//!
//! Calls resolve with canonical data or fail with an [`ApiError`] whose
//! [`message`](ApiError::message) is fit to show a customer.

mod client;
pub(crate) mod conversions;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Fallback message when the backend gives no reason.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Phrases that mark an authentication or session failure.
const SESSION_PHRASES: [&str; 6] = [
    "token",
    "session",
    "authorization",
    "expired",
    "unauthorized",
    "not authenticated",
];

/// Errors surfaced by API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response: connection refused, DNS failure, timeout.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Missing, expired or rejected credentials, after any refresh attempt.
    #[error("{0}")]
    Unauthorized(String),

    /// Rejected client-side; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend refused the request, e.g. out of stock.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Reason from the response body.
        message: String,
    },

    /// The backend answered with something we could not decode.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Human-readable message for display.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, when the backend responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Validation(_) | Self::Parse(_) => None,
        }
    }

    /// Whether this is an authentication/session failure.
    ///
    /// Callers use it to stay quiet about expected logouts instead of
    /// reporting them as errors.
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Network(_) | Self::Validation(_) => false,
            // A 401 only reaches here from sign-in, where the credentials
            // themselves were refused.
            Self::Server { message, .. } => mentions_session(message),
            Self::Parse(message) => mentions_session(message),
        }
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn mentions_session(message: &str) -> bool {
    let lower = message.to_lowercase();
    SESSION_PHRASES.iter().any(|p| lower.contains(p))
}
