use bazaar_core::ProductId;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::convert_wishlist;

impl ApiClient {
    /// Wishlisted product IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<Vec<ProductId>, ApiError> {
        convert_wishlist(self.get("/wishlist").await?)
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_to_wishlist(&self, id: &ProductId) -> Result<(), ApiError> {
        self.send_json(Method::POST, "/wishlist", &json!({ "product_id": id }))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_from_wishlist(&self, id: &ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/wishlist/{id}")).await?;
        Ok(())
    }
}
