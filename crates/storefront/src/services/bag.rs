//! Bag mutations.
//!
//! Quantity changes and removals are applied to the store before the backend
//! confirms them and undone if it refuses. Mutations of the same line are
//! serialized, so two quick taps on "+" land in order.

use std::sync::Arc;

use bazaar_core::BagItemId;
use tracing::{info, instrument, warn};

use super::locks::KeyedLocks;
use crate::api::types::{BagItem, NewBagItem};
use crate::api::{ApiClient, ApiError};
use crate::error::add_breadcrumb;
use crate::store::{BagAction, Store, selectors};

/// Outcome of a confirmed line mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum BagChange {
    Updated(BagItem),
    Removed(BagItemId),
}

#[derive(Debug, Clone)]
pub struct BagService {
    api: ApiClient,
    store: Store,
    locks: Arc<KeyedLocks<BagItemId>>,
}

impl BagService {
    #[must_use]
    pub fn new(api: ApiClient, store: Store) -> Self {
        Self {
            api,
            store,
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Replace the local bag with the server's.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<BagItem>, ApiError> {
        let items = self.api.get_bag().await?;
        self.store.dispatch(BagAction::SetBag(items.clone()));
        Ok(items)
    }

    /// Add a product. Not optimistic: the line ID comes from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero or the backend refuses.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add(&self, item: &NewBagItem) -> Result<BagItem, ApiError> {
        let mut line = self.api.add_to_bag(item).await?;
        if line.product.is_none() {
            line.product = self
                .store
                .select(|s| selectors::product(s, &line.product_id).cloned());
        }
        self.store.dispatch(BagAction::UpsertBagItem(line.clone()));
        info!(bag_item_id = %line.id, quantity = line.quantity, "Added to bag");
        Ok(line)
    }

    /// # Errors
    ///
    /// See [`set_quantity`](Self::set_quantity).
    pub async fn increment(&self, id: &BagItemId) -> Result<BagChange, ApiError> {
        self.change_quantity(id, |q| q.saturating_add(1)).await
    }

    /// Decrementing below one removes the line.
    ///
    /// # Errors
    ///
    /// See [`set_quantity`](Self::set_quantity).
    pub async fn decrement(&self, id: &BagItemId) -> Result<BagChange, ApiError> {
        self.change_quantity(id, |q| q.saturating_sub(1)).await
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the line is not in the bag, or the
    /// backend's error after the local change has been reverted.
    pub async fn set_quantity(&self, id: &BagItemId, quantity: u32) -> Result<BagChange, ApiError> {
        self.change_quantity(id, |_| quantity).await
    }

    #[instrument(skip(self, next), fields(bag_item_id = %id))]
    async fn change_quantity(
        &self,
        id: &BagItemId,
        next: impl FnOnce(u32) -> u32 + Send,
    ) -> Result<BagChange, ApiError> {
        let _guard = self.locks.lock(id).await;
        let previous = self.line(id)?;
        let quantity = next(previous.quantity);
        if quantity < 1 {
            return self.remove_locked(previous).await;
        }
        if quantity == previous.quantity {
            return Ok(BagChange::Updated(previous));
        }

        self.store.dispatch(BagAction::SetBagQuantity {
            id: id.clone(),
            quantity,
        });
        match self.api.update_bag_quantity(id, quantity).await {
            Ok(mut confirmed) => {
                if confirmed.product.is_none() {
                    confirmed.product.clone_from(&previous.product);
                }
                self.store
                    .dispatch(BagAction::UpsertBagItem(confirmed.clone()));
                Ok(BagChange::Updated(confirmed))
            }
            Err(e) => {
                warn!(error = %e, "Quantity change rejected, reverting");
                self.store.dispatch(BagAction::SetBagQuantity {
                    id: id.clone(),
                    quantity: previous.quantity,
                });
                add_breadcrumb("bag", "Reverted quantity change", Some(&[("bag_item_id", id.as_str())]));
                Err(e)
            }
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the line is not in the bag, or the
    /// backend's error after the line has been restored.
    #[instrument(skip(self), fields(bag_item_id = %id))]
    pub async fn remove(&self, id: &BagItemId) -> Result<BagChange, ApiError> {
        let _guard = self.locks.lock(id).await;
        let previous = self.line(id)?;
        self.remove_locked(previous).await
    }

    async fn remove_locked(&self, previous: BagItem) -> Result<BagChange, ApiError> {
        let id = previous.id.clone();
        self.store.dispatch(BagAction::RemoveBagItem(id.clone()));
        match self.api.remove_from_bag(&id).await {
            Ok(()) => Ok(BagChange::Removed(id)),
            Err(e) => {
                warn!(error = %e, "Removal rejected, restoring line");
                self.store.dispatch(BagAction::UpsertBagItem(previous));
                add_breadcrumb("bag", "Restored removed line", Some(&[("bag_item_id", id.as_str())]));
                Err(e)
            }
        }
    }

    /// Empty the bag. Not optimistic.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses; the local bag is untouched.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.api.clear_bag().await?;
        self.store.dispatch(BagAction::ClearBag);
        Ok(())
    }

    fn line(&self, id: &BagItemId) -> Result<BagItem, ApiError> {
        self.store
            .select(|s| s.bag.item(id).cloned())
            .ok_or_else(|| ApiError::Validation(format!("Bag item {id} is not in the bag")))
    }
}
