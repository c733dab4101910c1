//! Unified error handling with Sentry integration.
//!
//! Each boundary has its own error enum; [`StorefrontError`] aggregates them
//! for the binaries and for services that cross more than one boundary.

use bazaar_core::{EmailError, PriceError};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::realtime::RealtimeError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// REST call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Realtime channel could not be used.
    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),

    /// Token storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
}

impl StorefrontError {
    /// Human readable message for display.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(e) => e.message(),
            other => other.to_string(),
        }
    }

    /// Missing or expired session. Expected during normal use and not worth
    /// reporting.
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        match self {
            Self::Api(e) => e.is_session_error(),
            Self::Realtime(RealtimeError::NotAuthenticated) => true,
            _ => false,
        }
    }

    /// Log the error and send it to Sentry unless it is a session error, a
    /// client-side validation failure or refused credentials.
    pub fn report(&self) {
        if self.is_session_error() {
            tracing::debug!(error = %self, "Session error");
            return;
        }
        if matches!(
            self,
            Self::Api(ApiError::Validation(_)) | Self::Email(_) | Self::Price(_)
        ) {
            tracing::warn!(error = %self, "Validation error");
            return;
        }
        if matches!(self, Self::Api(ApiError::Server { status: 401, .. })) {
            tracing::warn!(error = %self, "Credentials refused");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("bag", "Changed quantity", Some(&[("bag_item_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
