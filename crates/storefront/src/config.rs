//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target a backend on the local machine.
//!
//! - `BAZAAR_BACKEND_URL` - REST backend base URL (default: `http://127.0.0.1:5000`)
//! - `BAZAAR_SOCKET_URL` - Realtime websocket URL (default: backend URL with
//!   `ws`/`wss` scheme and `/ws` path)
//! - `BAZAAR_STATE_DIR` - Directory for the persisted session token (default: `.bazaar`)
//! - `BAZAAR_ACCESS_TOKEN` - Bootstrap access token for headless runs
//! - `BAZAAR_CACHE_MAX_AGE_SECS` - Default cache entry lifetime (default: 300)
//! - `BAZAAR_CACHE_MAX_ENTRIES` - Cache capacity (default: 50)
//! - `BAZAAR_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `BAZAAR_SOCKET_RECONNECT_DELAY_MS` - Delay between reconnect attempts (default: 1000)
//! - `BAZAAR_SOCKET_RECONNECT_ATTEMPTS` - Reconnect attempts before giving up (default: 5)
//! - `BAZAAR_SOCKET_TIMEOUT_SECS` - Websocket handshake timeout (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST backend base URL
    pub backend_url: Url,
    /// Directory holding the persisted token file
    pub state_dir: PathBuf,
    /// Token to use when no session has been persisted yet
    pub bootstrap_token: Option<SecretString>,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Cache manager settings
    pub cache: CacheConfig,
    /// Realtime channel settings
    pub realtime: RealtimeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Cache manager sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an entry without a custom max age
    pub max_age: Duration,
    /// Maximum number of entries held at once
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5 * 60),
            max_entries: 50,
        }
    }
}

/// Realtime websocket settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Websocket endpoint
    pub url: Url,
    /// Delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Attempts before the connection task gives up
    pub reconnect_attempts: u32,
    /// Handshake timeout
    pub connect_timeout: Duration,
}

impl RealtimeConfig {
    /// Settings with the stock reconnect policy for the given endpoint.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            reconnect_delay: Duration::from_millis(1000),
            reconnect_attempts: 5,
            connect_timeout: Duration::from_secs(20),
        }
    }

    /// How long a long-running consumer waits before starting a fresh
    /// connection task once the previous one has given up: one full
    /// reconnect cycle, between 1 second and 5 minutes.
    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        self.reconnect_delay
            .checked_mul(self.reconnect_attempts.saturating_add(1))
            .unwrap_or(Duration::MAX)
            .clamp(Duration::from_secs(1), Duration::from_secs(5 * 60))
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_url = parse_url(
            "BAZAAR_BACKEND_URL",
            &lookup("BAZAAR_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        )?;
        let socket_url = match lookup("BAZAAR_SOCKET_URL") {
            Some(raw) => parse_url("BAZAAR_SOCKET_URL", &raw)?,
            None => derive_socket_url(&backend_url)?,
        };

        let cache = CacheConfig {
            max_age: Duration::from_secs(parse_or(&lookup, "BAZAAR_CACHE_MAX_AGE_SECS", 300)?),
            max_entries: parse_or(&lookup, "BAZAAR_CACHE_MAX_ENTRIES", 50)?,
        };
        if cache.max_age.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_CACHE_MAX_AGE_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if cache.max_entries == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_CACHE_MAX_ENTRIES".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let realtime = RealtimeConfig {
            url: socket_url,
            reconnect_delay: Duration::from_millis(parse_or(
                &lookup,
                "BAZAAR_SOCKET_RECONNECT_DELAY_MS",
                1000,
            )?),
            reconnect_attempts: parse_or(&lookup, "BAZAAR_SOCKET_RECONNECT_ATTEMPTS", 5)?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "BAZAAR_SOCKET_TIMEOUT_SECS",
                20,
            )?),
        };

        Ok(Self {
            backend_url,
            state_dir: lookup("BAZAAR_STATE_DIR").map_or_else(|| PathBuf::from(".bazaar"), PathBuf::from),
            bootstrap_token: lookup("BAZAAR_ACCESS_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "BAZAAR_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            cache,
            realtime,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for a backend at `backend_url` with every other value
    /// at its default. Used by tests and embedders that do not read the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL cannot be parsed.
    pub fn for_backend(backend_url: &str) -> Result<Self, ConfigError> {
        let backend = backend_url.to_string();
        Self::from_lookup(move |key| (key == "BAZAAR_BACKEND_URL").then(|| backend.clone()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a URL-valued variable.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a variable, falling back to a default when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Turn `http(s)://host:port/...` into `ws(s)://host:port/ws`.
fn derive_socket_url(backend: &Url) -> Result<Url, ConfigError> {
    let mut url = backend.clone();
    let scheme = if backend.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|()| {
        ConfigError::InvalidEnvVar(
            "BAZAAR_BACKEND_URL".to_string(),
            format!("cannot derive websocket URL from {backend}"),
        )
    })?;
    url.set_path("/ws");
    url.set_query(None);
    Ok(url)
}
