//! Seller and master listing management.

use std::sync::Arc;

use bazaar_core::ProductId;
use tracing::{info, instrument};

use crate::api::types::{Product, ProductDraft};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CatalogCache, keys};
use crate::store::{DataAction, Store};

#[derive(Debug, Clone)]
pub struct ProductAdminService {
    api: ApiClient,
    store: Store,
    cache: Arc<CatalogCache>,
}

impl ProductAdminService {
    #[must_use]
    pub const fn new(api: ApiClient, store: Store, cache: Arc<CatalogCache>) -> Self {
        Self { api, store, cache }
    }

    /// Reflect a saved listing locally: public ones are merged into the
    /// catalog, anything else is taken out of it.
    fn adopt(&self, product: &Product) {
        if product.approval_status.is_public() {
            self.store.dispatch(DataAction::UpsertProduct(product.clone()));
        } else {
            self.store
                .dispatch(DataAction::RemoveProduct(product.id.clone()));
        }
        self.cache.invalidate(keys::ALL_PRODUCTS);
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft, or the
    /// backend's error.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let product = self.api.create_product(draft).await?;
        info!(product_id = %product.id, status = ?product.approval_status, "Listing created");
        self.adopt(&product);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft, or the
    /// backend's error.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product, ApiError> {
        let product = self.api.update_product(id, draft).await?;
        self.adopt(&product);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns the backend's error; nothing changes locally.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        self.api.delete_product(id).await?;
        self.store.dispatch(DataAction::RemoveProduct(id.clone()));
        self.cache.invalidate(keys::ALL_PRODUCTS);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn pending(&self) -> Result<Vec<Product>, ApiError> {
        self.api.pending_products().await
    }

    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn approve(&self, id: &ProductId) -> Result<(), ApiError> {
        self.api.approve_product(id).await?;
        self.cache.invalidate(keys::ALL_PRODUCTS);
        info!("Listing approved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self, reason), fields(product_id = %id))]
    pub async fn reject(&self, id: &ProductId, reason: Option<&str>) -> Result<(), ApiError> {
        self.api.reject_product(id, reason).await?;
        self.store.dispatch(DataAction::RemoveProduct(id.clone()));
        self.cache.invalidate(keys::ALL_PRODUCTS);
        info!("Listing rejected");
        Ok(())
    }
}
