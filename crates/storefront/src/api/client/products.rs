//! Product endpoints: catalog reads plus seller/master management.

use bazaar_core::ProductId;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{convert_product, convert_products, unwrap_envelope};
use crate::api::types::{Product, ProductDraft, ProductQuery};

impl ApiClient {
    /// List approved products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload cannot be read.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let body = self.get_with_query("/products", &query.to_pairs()).await?;
        let products = convert_products(body)?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let body = self.get(&format!("/products/{id}")).await?;
        convert_product(&unwrap_envelope(body, &["product"]))
    }

    /// Create a listing. Seller listings start pending approval.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft without sending
    /// it, or an error from the backend.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        draft.validate()?;
        let body = self.send_json(Method::POST, "/products", draft).await?;
        convert_product(&unwrap_envelope(body, &["product"]))
    }

    /// Replace a listing's editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an invalid draft without sending
    /// it, or an error from the backend.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        draft.validate()?;
        let body = self
            .send_json(Method::PUT, &format!("/products/{id}"), draft)
            .await?;
        convert_product(&unwrap_envelope(body, &["product"]))
    }

    /// Delete a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/products/{id}")).await?;
        Ok(())
    }

    /// Listings awaiting master review.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn pending_products(&self) -> Result<Vec<Product>, ApiError> {
        convert_products(self.get("/products/pending").await?)
    }

    /// Approve a pending listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn approve_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.send_json(Method::POST, &format!("/products/{id}/approve"), &json!({}))
            .await?;
        Ok(())
    }

    /// Reject a pending listing with an optional reason for the seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reject_product(&self, id: &ProductId, reason: Option<&str>) -> Result<(), ApiError> {
        let body = reason.map_or_else(|| json!({}), |r| json!({ "reason": r }));
        self.send_json(Method::POST, &format!("/products/{id}/reject"), &body)
            .await?;
        Ok(())
    }
}
