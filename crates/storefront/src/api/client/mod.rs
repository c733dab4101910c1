//! HTTP plumbing shared by every endpoint.

mod auth;
mod bag;
mod categories;
mod orders;
mod products;
mod ratings;
mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use super::conversions::{TokenDto, decode};
use super::{ApiError, DEFAULT_ERROR_MESSAGE};
use crate::session::Session;

/// Paths that must never trigger a token refresh.
const NO_REFRESH_PATHS: [&str; 3] = ["/auth/login", "/auth/register", "/auth/refresh"];

/// Client for the BBHCBazaar REST API.
///
/// Cheap to clone; clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
    /// Serializes refreshes so concurrent 401s trigger one refresh.
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// One outgoing request, replayable after a refresh.
struct Request<'a> {
    method: Method,
    path: &'a str,
    query: &'a [(&'a str, String)],
    body: Option<Value>,
}

impl ApiClient {
    /// Create a client for `base_url` (the backend origin, without `/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, session: Session, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bazaar-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                session,
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Absolute URL for an API path such as `/products/42`.
    fn url(&self, path: &str, query: &[(&str, String)]) -> Url {
        let mut url = self.inner.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}/api{path}"));
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    pub(crate) async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Request {
            method: Method::GET,
            path,
            query: &[],
            body: None,
        })
        .await
    }

    pub(crate) async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        self.execute(Request {
            method: Method::GET,
            path,
            query,
            body: None,
        })
        .await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::validation(format!("Could not encode request: {e}")))?;
        self.execute(Request {
            method,
            path,
            query: &[],
            body: Some(body),
        })
        .await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Request {
            method: Method::DELETE,
            path,
            query: &[],
            body: None,
        })
        .await
    }

    /// Send a request, refreshing the token and retrying once on a 401.
    #[instrument(skip(self, request), fields(method = %request.method, path = request.path))]
    async fn execute(&self, request: Request<'_>) -> Result<Value, ApiError> {
        let token = self.inner.session.access_token();
        let response = self.send(&request, token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || NO_REFRESH_PATHS.contains(&request.path)
        {
            return Self::handle_response(response).await;
        }

        debug!("Access token rejected, attempting refresh");
        let first_failure = Self::handle_response(response).await;
        match self.refresh_access_token(token.as_ref()).await {
            Ok(fresh) => {
                let response = self.send(&request, Some(&fresh)).await?;
                Self::handle_response(response).await
            }
            Err(e) => {
                debug!(error = %e, "Token refresh failed");
                Err(match first_failure {
                    Err(original @ ApiError::Unauthorized(_)) => original,
                    _ => e,
                })
            }
        }
    }

    async fn send(
        &self,
        request: &Request<'_>,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), self.url(request.path, request.query))
            .header("Accept", "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Turn a response into JSON or an [`ApiError`].
    async fn handle_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(v) => v,
                Err(e) if status.is_success() => {
                    warn!(
                        error = %e,
                        body = %text.chars().take(200).collect::<String>(),
                        "Backend returned non-JSON body"
                    );
                    return Err(ApiError::Parse(e.to_string()));
                }
                Err(_) => Value::Null,
            }
        };

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        debug!(status = status.as_u16(), message = %message, "Request failed");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(message));
        }
        let err = ApiError::Server {
            status: status.as_u16(),
            message,
        };
        // Flask-JWT reports malformed tokens as 422
        if status == StatusCode::UNPROCESSABLE_ENTITY && err.is_session_error() {
            return Err(ApiError::Unauthorized(err.message()));
        }
        Err(err)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// `stale` is the token that was just rejected. If another task already
    /// replaced it, that token is reused instead of refreshing twice.
    async fn refresh_access_token(
        &self,
        stale: Option<&SecretString>,
    ) -> Result<SecretString, ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.inner.session.access_token()
            && stale.is_none_or(|s| s.expose_secret() != current.expose_secret())
        {
            return Ok(current);
        }

        let refresh = self.inner.session.refresh_token().ok_or_else(|| {
            ApiError::Unauthorized("Session expired, please log in again".to_string())
        })?;

        let response = self
            .send(
                &Request {
                    method: Method::POST,
                    path: "/auth/refresh",
                    query: &[],
                    body: None,
                },
                Some(&refresh),
            )
            .await?;

        let body = match Self::handle_response(response).await {
            Ok(body) => body,
            Err(ApiError::Server { message, .. } | ApiError::Unauthorized(message)) => {
                return Err(ApiError::Unauthorized(message));
            }
            Err(e) => return Err(e),
        };

        let tokens: TokenDto = decode(body, "refresh response")?;
        let fresh = SecretString::from(tokens.access_token);
        self.inner.session.update_access_token(fresh.clone());
        debug!("Access token refreshed");
        Ok(fresh)
    }
}

/// Message from an error body: `error`, then `message`, then `msg`.
fn error_message(body: &Value) -> String {
    ["error", "message", "msg"]
        .iter()
        .find_map(|key| {
            body.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        })
        .map_or_else(|| DEFAULT_ERROR_MESSAGE.to_string(), str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryTokenStorage;
    use crate::store::Store;

    fn client(base: &str) -> ApiClient {
        let session = Session::new(Store::new(), Arc::new(MemoryTokenStorage::new()));
        ApiClient::new(Url::parse(base).unwrap(), session, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_building() {
        let api = client("http://127.0.0.1:5000");
        assert_eq!(api.url("/products/7", &[]).as_str(), "http://127.0.0.1:5000/api/products/7");

        let api = client("https://shop.example/backend/");
        let url = api.url("/products", &[("search", "red kurta".to_string())]);
        assert_eq!(url.as_str(), "https://shop.example/backend/api/products?search=red+kurta");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(&json!({"error": "Out of stock"})), "Out of stock");
        assert_eq!(error_message(&json!({"message": "Nope"})), "Nope");
        assert_eq!(error_message(&json!({"msg": "Token has expired"})), "Token has expired");
        assert_eq!(error_message(&json!({"error": ""})), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(&Value::Null), DEFAULT_ERROR_MESSAGE);
    }
}
