//! CLI error type.

use bazaar_storefront::StorefrontError;
use bazaar_storefront::api::ApiError;
use bazaar_storefront::config::ConfigError;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.message())]
    Storefront(#[from] StorefrontError),

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Forward storefront errors to Sentry and the log.
    pub fn report(&self) {
        if let Self::Storefront(e) = self {
            e.report();
        }
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Storefront(e.into())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Storefront(e.into())
    }
}
