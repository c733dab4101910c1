//! Token source shared by the API and realtime clients.
//!
//! The auth slice holds the live tokens. Persistent storage is the fallback
//! when the store has not been rehydrated yet, and the place new tokens are
//! written so they survive a restart.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::storage::{REFRESH_TOKEN_KEY, StorageError, TOKEN_KEY, TokenStorage};
use crate::store::{AuthAction, Store};

#[derive(Clone)]
pub struct Session {
    store: Store,
    storage: Arc<dyn TokenStorage>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.access_token().is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(store: Store, storage: Arc<dyn TokenStorage>) -> Self {
        Self { store, storage }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Current access token: the store's, else the persisted one.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.store
            .select(|s| s.auth.token.clone())
            .or_else(|| self.stored(TOKEN_KEY))
    }

    /// Current refresh token: the store's, else the persisted one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.store
            .select(|s| s.auth.refresh_token.clone())
            .or_else(|| self.stored(REFRESH_TOKEN_KEY))
    }

    /// Persist a login's tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be written.
    pub fn persist_tokens(
        &self,
        token: &SecretString,
        refresh_token: Option<&SecretString>,
    ) -> Result<(), StorageError> {
        self.storage.save(TOKEN_KEY, token.expose_secret())?;
        match refresh_token {
            Some(refresh) => self.storage.save(REFRESH_TOKEN_KEY, refresh.expose_secret()),
            None => self.storage.remove(REFRESH_TOKEN_KEY),
        }
    }

    /// Adopt a refreshed access token in the store and on disk.
    pub fn update_access_token(&self, token: SecretString) {
        if let Err(e) = self.storage.save(TOKEN_KEY, token.expose_secret()) {
            warn!(error = %e, "Failed to persist refreshed token");
        }
        self.store.dispatch(AuthAction::SetAccessToken(token));
    }

    /// Rehydrate the store from persistent storage. Returns whether a token
    /// was found.
    pub fn rehydrate(&self) -> bool {
        let token = self.stored(TOKEN_KEY);
        let found = token.is_some();
        self.store.dispatch(AuthAction::CheckAuth {
            token,
            refresh_token: self.stored(REFRESH_TOKEN_KEY),
        });
        found
    }

    /// Forget both tokens everywhere.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(error = %e, key, "Failed to remove stored token");
            }
        }
        self.store.dispatch(AuthAction::Logout);
    }

    fn stored(&self, key: &str) -> Option<SecretString> {
        match self.storage.load(key) {
            Ok(value) => value.filter(|v| !v.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, key, "Failed to read stored token");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStorage;

    fn session() -> (Session, Arc<MemoryTokenStorage>) {
        let storage = Arc::new(MemoryTokenStorage::new());
        (Session::new(Store::new(), storage.clone()), storage)
    }

    fn exposed(token: Option<SecretString>) -> Option<String> {
        token.map(|t| t.expose_secret().to_string())
    }

    #[test]
    fn test_falls_back_to_storage() {
        let (session, storage) = session();
        assert!(session.access_token().is_none());
        storage.save(TOKEN_KEY, "stored").unwrap();
        assert_eq!(exposed(session.access_token()).as_deref(), Some("stored"));
    }

    #[test]
    fn test_store_token_wins() {
        let (session, storage) = session();
        storage.save(TOKEN_KEY, "stored").unwrap();
        session
            .store()
            .dispatch(AuthAction::SetAccessToken(SecretString::from("memory".to_string())));
        assert_eq!(exposed(session.access_token()).as_deref(), Some("memory"));
    }

    #[test]
    fn test_update_access_token_persists() {
        let (session, storage) = session();
        session.update_access_token(SecretString::from("fresh".to_string()));
        assert_eq!(storage.load(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
        assert_eq!(exposed(session.access_token()).as_deref(), Some("fresh"));
    }

    #[test]
    fn test_rehydrate_and_clear() {
        let (session, storage) = session();
        assert!(!session.rehydrate());

        session
            .persist_tokens(&SecretString::from("a".to_string()), Some(&SecretString::from("r".to_string())))
            .unwrap();
        assert!(session.rehydrate());
        assert_eq!(exposed(session.refresh_token()).as_deref(), Some("r"));

        session.clear();
        assert!(session.access_token().is_none());
        assert!(storage.load(REFRESH_TOKEN_KEY).unwrap().is_none());
    }
}
