//! Application state container.
//!
//! The [`Store`] is the single in-memory source of truth for a session. All
//! mutation goes through [`Store::dispatch`]; every dispatch bumps a version
//! number published on a `watch` channel so views can re-render.
//!
//! ```rust
//! use bazaar_storefront::store::{DataAction, Store};
//!
//! let store = Store::new();
//! store.dispatch(DataAction::ToggleWishlist("42".into()));
//! assert!(store.select(|s| s.data.home.wishlist.len() == 1));
//! ```

pub mod auth;
pub mod bag;
pub mod content;
pub mod data;
pub mod selectors;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::trace;

pub use auth::{AuthAction, AuthState, LoginSuccess};
pub use bag::{BagAction, BagState};
pub use data::{DataAction, DataState, HomeState};

/// Combined state of every slice.
#[derive(Debug, Clone, Default)]
pub struct RootState {
    pub data: DataState,
    pub auth: AuthState,
    pub bag: BagState,
}

/// Any action accepted by the store.
#[derive(Debug, Clone)]
pub enum Action {
    Data(DataAction),
    Auth(AuthAction),
    Bag(BagAction),
}

impl Action {
    /// Redux-style action type, e.g. `data/toggleWishlist`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Data(a) => a.name(),
            Self::Auth(a) => a.name(),
            Self::Bag(a) => a.name(),
        }
    }
}

impl From<DataAction> for Action {
    fn from(action: DataAction) -> Self {
        Self::Data(action)
    }
}

impl From<AuthAction> for Action {
    fn from(action: AuthAction) -> Self {
        Self::Auth(action)
    }
}

impl From<BagAction> for Action {
    fn from(action: BagAction) -> Self {
        Self::Bag(action)
    }
}

/// Shared handle to the session state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<RootState>,
    version: watch::Sender<u64>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store with initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(RootState::default())
    }

    #[must_use]
    pub fn with_state(state: RootState) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                version,
            }),
        }
    }

    /// Apply an action and return the new version.
    pub fn dispatch(&self, action: impl Into<Action>) -> u64 {
        let action = action.into();
        let name = action.name();
        {
            let mut state = self
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match action {
                Action::Data(a) => data::reduce(&mut state.data, a),
                Action::Auth(a) => auth::reduce(&mut state.auth, a),
                Action::Bag(a) => bag::reduce(&mut state.bag, a),
            }
        }

        let mut version = 0;
        self.inner.version.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        trace!(action = name, version, "Dispatched");
        version
    }

    /// Read from the current state without cloning it.
    pub fn select<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Clone of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> RootState {
        self.select(Clone::clone)
    }

    /// Number of dispatches so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    /// Receiver that is notified after every dispatch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_bumps_version() {
        let store = Store::new();
        assert_eq!(store.version(), 0);
        assert_eq!(store.dispatch(DataAction::SetLoading(true)), 1);
        assert_eq!(store.dispatch(BagAction::ClearBag), 2);
        assert!(store.select(|s| s.data.loading));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = Store::new();
        let mut rx = store.subscribe();

        let handle = {
            let store = store.clone();
            tokio::spawn(async move {
                store.dispatch(DataAction::ToggleWishlist("7".into()));
            })
        };
        rx.changed().await.unwrap();
        handle.await.unwrap();

        assert_eq!(*rx.borrow(), 1);
        assert!(store.select(|s| s.data.home.wishlist.contains(&"7".into())));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::from(DataAction::ToggleWishlist("1".into())).name(), "data/toggleWishlist");
        assert_eq!(Action::from(AuthAction::Logout).name(), "auth/logout");
    }
}
