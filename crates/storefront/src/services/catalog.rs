//! Catalog reads through the cache, and realtime merging.

use std::sync::Arc;

use bazaar_core::ProductId;
use tracing::{debug, instrument};

use crate::api::types::{Category, CommissionRates, Product, ProductQuery};
use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheValue, CatalogCache, keys};
use crate::realtime::{
    PRODUCT_CREATED, PRODUCT_UPDATED, RATING_UPDATED, RealtimeClient, RealtimeEvent,
    SubscriptionId,
};
use crate::store::{DataAction, Store, selectors};

#[derive(Debug, Clone)]
pub struct CatalogService {
    api: ApiClient,
    store: Store,
    cache: Arc<CatalogCache>,
}

impl CatalogService {
    #[must_use]
    pub const fn new(api: ApiClient, store: Store, cache: Arc<CatalogCache>) -> Self {
        Self { api, store, cache }
    }

    /// The approved catalog for the home page.
    ///
    /// Served from the cache when fresh; otherwise fetched, stored and cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog has to be fetched and the request
    /// fails. The message is also recorded in the data slice.
    #[instrument(skip(self))]
    pub async fn home_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(keys::HOME_PRODUCTS) {
            debug!(count = products.len(), "Home products served from cache");
            return Ok(products);
        }
        self.fetch_home_products().await
    }

    /// Re-fetch the catalog, bypassing and replacing cached copies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<Product>, ApiError> {
        let dropped = self.cache.invalidate(keys::ALL_PRODUCTS);
        debug!(dropped, "Product cache invalidated");
        self.fetch_home_products().await
    }

    async fn fetch_home_products(&self) -> Result<Vec<Product>, ApiError> {
        self.store.dispatch(DataAction::SetLoading(true));
        let result = self.api.list_products(&ProductQuery::default()).await;
        self.store.dispatch(DataAction::SetLoading(false));

        match result {
            Ok(mut products) => {
                products.retain(|p| p.approval_status.is_public());
                self.store.dispatch(DataAction::SetError(None));
                self.store
                    .dispatch(DataAction::SetHomeProducts(products.clone()));
                self.cache.set(
                    keys::HOME_PRODUCTS,
                    CacheValue::Products(products.clone()),
                    None,
                );
                Ok(products)
            }
            Err(e) => {
                self.store.dispatch(DataAction::SetError(Some(e.message())));
                Err(e)
            }
        }
    }

    /// Server-side filtered listing. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        self.api.list_products(query).await
    }

    /// A single product, from the cache or the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not cached and cannot be fetched.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = keys::product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key) {
            return Ok(*product);
        }

        let product = self.api.get_product(id).await?;
        if product.approval_status.is_public() {
            self.store.dispatch(DataAction::UpsertProduct(product.clone()));
        }
        self.cache
            .set(key, CacheValue::Product(Box::new(product.clone())), None);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the categories are not cached and cannot be fetched.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(keys::CATEGORIES) {
            return Ok(categories);
        }
        let categories = self.api.list_categories().await?;
        self.cache.set(
            keys::CATEGORIES,
            CacheValue::Categories(categories.clone()),
            None,
        );
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns an error if the rates are not cached and cannot be fetched.
    pub async fn commission_rates(&self) -> Result<CommissionRates, ApiError> {
        if let Some(CacheValue::Commissions(rates)) = self.cache.get(keys::COMMISSIONS) {
            return Ok(rates);
        }
        let rates = self.api.commission_rates().await?;
        self.cache
            .set(keys::COMMISSIONS, CacheValue::Commissions(rates.clone()), None);
        Ok(rates)
    }

    // =========================================================================
    // Realtime merging
    // =========================================================================

    /// Merge a pushed event into the store and drop stale cache entries.
    pub fn apply_event(&self, event: &RealtimeEvent) {
        match event {
            RealtimeEvent::ProductCreated(product) => {
                if product.approval_status.is_public() {
                    self.store.dispatch(DataAction::UpsertProduct(product.clone()));
                } else {
                    self.store
                        .dispatch(DataAction::RemoveProduct(product.id.clone()));
                }
                self.cache.invalidate(keys::ALL_PRODUCTS);
            }
            RealtimeEvent::ProductUpdated(patch) => {
                let known = self
                    .store
                    .select(|s| selectors::product(s, &patch.id).is_some());
                let hidden = patch.approval_status.is_some_and(|s| !s.is_public());

                if hidden {
                    self.store.dispatch(DataAction::RemoveProduct(patch.id.clone()));
                } else if known {
                    self.store.dispatch(DataAction::PatchProduct(patch.clone()));
                } else if let Some(product) = patch.to_product() {
                    self.store.dispatch(DataAction::UpsertProduct(product));
                } else {
                    debug!(product_id = %patch.id, "Partial update for unknown product ignored");
                }
                self.cache.invalidate(keys::ALL_PRODUCTS);
            }
            RealtimeEvent::RatingUpdated(update) => {
                self.store
                    .dispatch(DataAction::ApplyRatingStats(update.clone()));
                self.cache.delete(&keys::rating_stats(&update.product_id));
                self.cache.delete(&keys::product(&update.product_id));
            }
            RealtimeEvent::Other { event, .. } => {
                debug!(event, "Ignoring realtime event");
            }
        }
    }

    /// Subscribe this service to every catalog event on `realtime`.
    pub fn attach(&self, realtime: &RealtimeClient) -> Vec<SubscriptionId> {
        [PRODUCT_CREATED, PRODUCT_UPDATED, RATING_UPDATED]
            .into_iter()
            .map(|event| {
                let service = self.clone();
                realtime.subscribe(event, move |e| service.apply_event(e))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{ApprovalStatus, Price};
    use url::Url;

    use super::*;
    use crate::api::types::{ProductPatch, RatingStats, RatingUpdate};
    use crate::config::CacheConfig;
    use crate::session::Session;
    use crate::storage::MemoryTokenStorage;

    fn service() -> CatalogService {
        let store = Store::new();
        let session = Session::new(store.clone(), Arc::new(MemoryTokenStorage::new()));
        let api = ApiClient::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            session,
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        CatalogService::new(api, store, Arc::new(CatalogCache::new(CacheConfig::default())))
    }

    fn product(id: &str) -> Product {
        Product::new(id, format!("Item {id}"), Price::from_rupees(100), Price::from_rupees(150))
    }

    fn ids(service: &CatalogService) -> Vec<String> {
        service.store.select(|s| {
            s.data
                .home
                .products
                .iter()
                .map(|p| p.id.as_str().to_string())
                .collect()
        })
    }

    #[test]
    fn test_created_event_prepends_and_invalidates() {
        let service = service();
        service
            .store
            .dispatch(DataAction::SetHomeProducts(vec![product("1")]));
        service.cache.set(
            keys::HOME_PRODUCTS,
            CacheValue::Products(vec![product("1")]),
            None,
        );
        service.cache.set(keys::CATEGORIES, CacheValue::Categories(vec![]), None);

        service.apply_event(&RealtimeEvent::ProductCreated(product("2")));

        assert_eq!(ids(&service), ["2", "1"]);
        assert!(service.cache.get(keys::HOME_PRODUCTS).is_none());
        assert!(service.cache.get(keys::CATEGORIES).is_some());
    }

    #[test]
    fn test_pending_product_is_not_shown() {
        let service = service();
        let mut pending = product("9");
        pending.approval_status = ApprovalStatus::Pending;
        service.apply_event(&RealtimeEvent::ProductCreated(pending));
        assert!(ids(&service).is_empty());
    }

    #[test]
    fn test_updated_event_merges_in_place() {
        let service = service();
        service.store.dispatch(DataAction::SetHomeProducts(vec![
            product("1"),
            product("2"),
            product("3"),
        ]));

        service.apply_event(&RealtimeEvent::ProductUpdated(ProductPatch {
            id: ProductId::new("2"),
            name: Some("Renamed".to_string()),
            ..ProductPatch::default()
        }));

        assert_eq!(ids(&service), ["1", "2", "3"]);
        let name = service.store.select(|s| {
            selectors::product(s, &ProductId::new("2"))
                .map(|p| p.name.clone())
                .unwrap()
        });
        assert_eq!(name, "Renamed");
    }

    #[test]
    fn test_partial_update_for_unknown_product_is_ignored() {
        let service = service();
        service.apply_event(&RealtimeEvent::ProductUpdated(ProductPatch {
            id: ProductId::new("5"),
            quantity: Some(3),
            ..ProductPatch::default()
        }));
        assert!(ids(&service).is_empty());
    }

    #[test]
    fn test_rejected_update_removes_product() {
        let service = service();
        service
            .store
            .dispatch(DataAction::SetHomeProducts(vec![product("1")]));
        service.apply_event(&RealtimeEvent::ProductUpdated(ProductPatch {
            id: ProductId::new("1"),
            approval_status: Some(ApprovalStatus::Rejected),
            ..ProductPatch::default()
        }));
        assert!(ids(&service).is_empty());
    }

    #[test]
    fn test_rating_event_targets_one_product() {
        let service = service();
        service
            .store
            .dispatch(DataAction::SetHomeProducts(vec![product("1"), product("2")]));
        let key = keys::rating_stats(&ProductId::new("2"));
        service
            .cache
            .set(&key, CacheValue::RatingStats(RatingStats::default()), None);

        service.apply_event(&RealtimeEvent::RatingUpdated(RatingUpdate {
            product_id: ProductId::new("2"),
            stats: RatingStats {
                total_ratings: 3,
                average_rating: 4.0,
                ..RatingStats::default()
            },
        }));

        let ratings = service.store.select(|s| {
            s.data
                .home
                .products
                .iter()
                .map(|p| p.rating.as_ref().map(|r| r.total_ratings))
                .collect::<Vec<_>>()
        });
        assert_eq!(ratings, [None, Some(3)]);
        assert!(service.cache.get(&key).is_none());
    }

    #[test]
    fn test_attach_registers_three_handlers() {
        let service = service();
        let session = Session::new(Store::new(), Arc::new(MemoryTokenStorage::new()));
        let realtime = RealtimeClient::new(
            crate::config::RealtimeConfig::new(Url::parse("ws://127.0.0.1:9/ws").unwrap()),
            session,
        );

        let subscriptions = service.attach(&realtime);
        assert_eq!(subscriptions.len(), 3);

        realtime.emit_local(&RealtimeEvent::ProductCreated(product("7")));
        assert_eq!(ids(&service), ["7"]);
    }
}
