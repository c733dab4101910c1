//! Wishlist with optimistic toggling.

use std::sync::Arc;

use bazaar_core::ProductId;
use tracing::{instrument, warn};

use super::locks::KeyedLocks;
use crate::api::{ApiClient, ApiError};
use crate::error::add_breadcrumb;
use crate::store::{DataAction, Store, selectors};

/// Outcome of a confirmed toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct WishlistService {
    api: ApiClient,
    store: Store,
    locks: Arc<KeyedLocks<ProductId>>,
}

impl WishlistService {
    #[must_use]
    pub fn new(api: ApiClient, store: Store) -> Self {
        Self {
            api,
            store,
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Replace the local wishlist with the server's.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; local state is left as is.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<ProductId>, ApiError> {
        let ids = self.api.get_wishlist().await?;
        self.store.dispatch(DataAction::SetHomeWishlist(ids.clone()));
        Ok(ids)
    }

    /// Flip membership of `id` locally first, then confirm with the backend.
    ///
    /// On failure the local flip is undone before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the backend's error after reverting.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn toggle(&self, id: &ProductId) -> Result<WishlistChange, ApiError> {
        if id.as_str().is_empty() {
            return Err(ApiError::Validation("Product ID is required".to_string()));
        }
        let _guard = self.locks.lock(id).await;

        let was_listed = self.store.select(|s| selectors::is_wishlisted(s, id));
        self.store.dispatch(DataAction::ToggleWishlist(id.clone()));

        let result = if was_listed {
            self.api.remove_from_wishlist(id).await
        } else {
            self.api.add_to_wishlist(id).await
        };

        match result {
            Ok(()) => Ok(if was_listed {
                WishlistChange::Removed
            } else {
                WishlistChange::Added
            }),
            Err(e) => {
                warn!(error = %e, "Wishlist update rejected, reverting");
                self.store.dispatch(DataAction::ToggleWishlist(id.clone()));
                add_breadcrumb(
                    "wishlist",
                    "Reverted wishlist toggle",
                    Some(&[("product_id", id.as_str())]),
                );
                Err(e)
            }
        }
    }
}
