use bazaar_core::ProductId;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::instrument;

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{convert_rating, convert_rating_stats, unwrap_envelope};
use crate::api::types::{Rating, RatingStats};

impl ApiClient {
    /// The signed-in customer's rating of a product, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn my_rating(&self, id: &ProductId) -> Result<Option<Rating>, ApiError> {
        let body = self.get(&format!("/products/{id}/ratings/me")).await?;
        match unwrap_envelope(body, &["rating"]) {
            Value::Null => Ok(None),
            rating => convert_rating(&rating, id).map(Some),
        }
    }

    /// Create or replace the customer's rating.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a value outside 1..=5 without
    /// sending it, or an error from the backend.
    #[instrument(skip(self, review), fields(product_id = %id))]
    pub async fn submit_rating(
        &self,
        id: &ProductId,
        rating: u8,
        review: Option<&str>,
    ) -> Result<Rating, ApiError> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::validation("Rating must be between 1 and 5"));
        }
        let body = self
            .send_json(
                Method::POST,
                &format!("/products/{id}/ratings"),
                &json!({ "rating": rating, "review_text": review }),
            )
            .await?;
        convert_rating(&unwrap_envelope(body, &["rating"]), id)
    }

    /// Aggregate rating for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn rating_stats(&self, id: &ProductId) -> Result<RatingStats, ApiError> {
        let body = self.get(&format!("/products/{id}/ratings/stats")).await?;
        convert_rating_stats(&unwrap_envelope(body, &["stats"]))
    }
}
