use std::sync::Arc;

use bazaar_core::ProductId;
use tracing::instrument;

use crate::api::types::{Rating, RatingStats, RatingUpdate};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheValue, CatalogCache, keys};
use crate::store::{DataAction, Store};

/// Product ratings. Submitting is not optimistic.
#[derive(Debug, Clone)]
pub struct RatingService {
    api: ApiClient,
    store: Store,
    cache: Arc<CatalogCache>,
}

impl RatingService {
    #[must_use]
    pub const fn new(api: ApiClient, store: Store, cache: Arc<CatalogCache>) -> Self {
        Self { api, store, cache }
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn mine(&self, id: &ProductId) -> Result<Option<Rating>, ApiError> {
        self.api.my_rating(id).await
    }

    /// Aggregate rating, cached per product.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats are not cached and cannot be fetched.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn stats(&self, id: &ProductId) -> Result<RatingStats, ApiError> {
        let key = keys::rating_stats(id);
        if let Some(CacheValue::RatingStats(stats)) = self.cache.get(&key) {
            return Ok(stats);
        }
        let stats = self.api.rating_stats(id).await?;
        self.cache.set(key, CacheValue::RatingStats(stats.clone()), None);
        self.store.dispatch(DataAction::ApplyRatingStats(RatingUpdate {
            product_id: id.clone(),
            stats: stats.clone(),
        }));
        Ok(stats)
    }

    /// Rate a product 1 to 5 stars.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an out-of-range value, or the
    /// backend's error. Cached stats are left alone on failure.
    #[instrument(skip(self, review), fields(product_id = %id, rating))]
    pub async fn submit(
        &self,
        id: &ProductId,
        rating: u8,
        review: Option<&str>,
    ) -> Result<Rating, ApiError> {
        let saved = self.api.submit_rating(id, rating, review).await?;
        self.cache.delete(&keys::rating_stats(id));
        self.cache.delete(&keys::product(id));
        Ok(saved)
    }
}
