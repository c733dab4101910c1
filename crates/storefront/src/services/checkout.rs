//! QR pickup checkout of the whole bag.

use std::sync::Arc;

use bazaar_core::BagItemId;
use tracing::{info, instrument, warn};

use crate::api::types::{NewOrder, Order};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CatalogCache, keys};
use crate::error::add_breadcrumb;
use crate::store::{BagAction, Store};

#[derive(Debug, Clone)]
pub struct CheckoutService {
    api: ApiClient,
    store: Store,
    cache: Arc<CatalogCache>,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(api: ApiClient, store: Store, cache: Arc<CatalogCache>) -> Self {
        Self { api, store, cache }
    }

    /// Turn every bag line into an order, then empty the bag.
    ///
    /// Each line leaves the bag as soon as its order is placed, so a retry
    /// after a refusal only orders what is still in the bag. Stops at the
    /// first refused line; that line and the ones after it stay untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an empty bag, or the first error
    /// from the backend.
    #[instrument(skip(self))]
    pub async fn checkout(&self, pickup_location: Option<String>) -> Result<Vec<Order>, ApiError> {
        let items = self.store.select(|s| s.bag.items.clone());
        if items.is_empty() {
            return Err(ApiError::Validation("Your bag is empty".to_string()));
        }

        let mut orders = Vec::with_capacity(items.len());
        for item in &items {
            let request = NewOrder::from_bag_item(item, pickup_location.clone());
            match self.api.create_order(&request).await {
                Ok(order) => {
                    orders.push(order);
                    self.remove_ordered_line(&item.id).await;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        placed = orders.len(),
                        bag_item_id = %item.id,
                        "Checkout stopped"
                    );
                    if !orders.is_empty() {
                        self.cache.invalidate(keys::ALL_PRODUCTS);
                    }
                    return Err(e);
                }
            }
        }

        self.api.clear_bag().await?;
        self.store.dispatch(BagAction::ClearBag);
        // Stock levels changed.
        self.cache.invalidate(keys::ALL_PRODUCTS);
        info!(orders = orders.len(), "Checkout complete");
        Ok(orders)
    }

    /// Drop a line whose order was placed, locally even if the backend
    /// refuses, so it is never ordered twice from this session.
    async fn remove_ordered_line(&self, id: &BagItemId) {
        if let Err(e) = self.api.remove_from_bag(id).await {
            warn!(error = %e, bag_item_id = %id, "Ordered line is still in the remote bag");
            add_breadcrumb(
                "checkout",
                "Ordered line left in remote bag",
                Some(&[("bag_item_id", id.as_str())]),
            );
        }
        self.store.dispatch(BagAction::RemoveBagItem(id.clone()));
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.api.list_orders().await
    }
}
