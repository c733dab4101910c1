use bazaar_core::BagItemId;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{convert_bag, convert_bag_item, unwrap_envelope};
use crate::api::types::{BagItem, NewBagItem};

fn check_quantity(quantity: u32) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::validation("Quantity must be greater than zero"));
    }
    Ok(())
}

impl ApiClient {
    /// The customer's bag with product snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_bag(&self) -> Result<Vec<BagItem>, ApiError> {
        convert_bag(self.get("/bag").await?)
    }

    /// Add a product to the bag.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a zero quantity, or an error from
    /// the backend.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_to_bag(&self, item: &NewBagItem) -> Result<BagItem, ApiError> {
        check_quantity(item.quantity)?;
        let body = self.send_json(Method::POST, "/bag", item).await?;
        convert_bag_item(&unwrap_envelope(body, &["bag_item", "item"]))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a zero quantity, or an error from
    /// the backend.
    #[instrument(skip(self), fields(bag_item_id = %id))]
    pub async fn update_bag_quantity(
        &self,
        id: &BagItemId,
        quantity: u32,
    ) -> Result<BagItem, ApiError> {
        check_quantity(quantity)?;
        let body = self
            .send_json(Method::PUT, &format!("/bag/{id}"), &json!({ "quantity": quantity }))
            .await?;
        convert_bag_item(&unwrap_envelope(body, &["bag_item", "item"]))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self), fields(bag_item_id = %id))]
    pub async fn remove_from_bag(&self, id: &BagItemId) -> Result<(), ApiError> {
        self.delete(&format!("/bag/{id}")).await?;
        Ok(())
    }

    /// Empty the bag.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self))]
    pub async fn clear_bag(&self) -> Result<(), ApiError> {
        self.delete("/bag/clear").await?;
        Ok(())
    }
}
