//! Sign-in lifecycle.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, instrument};

use crate::api::types::{Registration, User};
use crate::api::{ApiClient, ApiError};
use crate::cache::CatalogCache;
use crate::error::{StorefrontError, clear_sentry_user, set_sentry_user};
use crate::realtime::RealtimeClient;
use crate::store::{AuthAction, BagAction, DataAction, LoginSuccess};

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    cache: Arc<CatalogCache>,
    realtime: RealtimeClient,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient, cache: Arc<CatalogCache>, realtime: RealtimeClient) -> Self {
        Self {
            api,
            cache,
            realtime,
        }
    }

    /// Sign in and persist the tokens.
    ///
    /// # Errors
    ///
    /// Returns an API error for invalid input or rejected credentials, or a
    /// storage error if the tokens cannot be saved. The failure message is
    /// recorded in the auth slice either way.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, StorefrontError> {
        self.api.session().store().dispatch(AuthAction::LoginStart);
        let result = self.api.login(email, password).await;
        self.start_session(result)
    }

    /// Create an account and sign straight into it.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login); a taken email comes back as a 409.
    #[instrument(skip(self, registration))]
    pub async fn register(&self, registration: &Registration) -> Result<User, StorefrontError> {
        self.api.session().store().dispatch(AuthAction::LoginStart);
        let result = self.api.register(registration).await;
        self.start_session(result)
    }

    fn start_session(&self, result: Result<LoginSuccess, ApiError>) -> Result<User, StorefrontError> {
        let session = self.api.session();
        let store = session.store();

        let success = match result {
            Ok(success) => success,
            Err(e) => {
                store.dispatch(AuthAction::LoginFailure(e.message()));
                return Err(e.into());
            }
        };

        if let Err(e) = session.persist_tokens(&success.token, success.refresh_token.as_ref()) {
            store.dispatch(AuthAction::LoginFailure(e.to_string()));
            return Err(e.into());
        }

        let user = success.user.clone();
        set_sentry_user(&user.id, user.email.as_deref());
        store.dispatch(AuthAction::LoginSuccess(success));
        info!(user_id = %user.id, "Session started");
        Ok(user)
    }

    /// Forget the session: tokens, cached data, the bag and wishlist, and
    /// the realtime connection.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let session = self.api.session();
        session.clear();
        self.cache.clear();
        self.realtime.disconnect();

        let store = session.store();
        store.dispatch(BagAction::ClearBag);
        store.dispatch(DataAction::SetHomeWishlist(Vec::new()));
        clear_sentry_user();
        info!("Session ended");
    }

    /// Resume a persisted session.
    ///
    /// Returns `None` when there is nothing to resume or the stored token
    /// is no longer accepted; a rejected token is dropped quietly.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than session errors, such as the
    /// backend being unreachable. The token is kept in that case.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<User>, StorefrontError> {
        let session = self.api.session();
        if !session.rehydrate() {
            debug!("No stored session");
            return Ok(None);
        }

        match self.api.me().await {
            Ok(user) => {
                set_sentry_user(&user.id, user.email.as_deref());
                session.store().dispatch(AuthAction::RestoreUser(user.clone()));
                info!(user_id = %user.id, "Session restored");
                Ok(Some(user))
            }
            Err(e) if e.is_session_error() => {
                debug!(error = %e, "Stored session rejected");
                session.clear();
                Ok(None)
            }
            Err(e) => Err(StorefrontError::Api(e)),
        }
    }

    /// Whether the current session belongs to a signed-in user.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.session().store().select(|s| s.auth.is_authenticated)
    }

    /// Fail fast with the same error the backend would give.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when nobody is signed in.
    pub fn require_user(&self) -> Result<User, ApiError> {
        self.api
            .session()
            .store()
            .select(|s| s.auth.user.clone())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
