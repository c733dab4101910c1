//! Application root owning every shared component.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::CatalogCache;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::realtime::RealtimeClient;
use crate::services::{
    AuthService, BagService, CatalogService, CheckoutService, ProductAdminService, RatingService,
    WishlistService,
};
use crate::session::Session;
use crate::storage::{FileTokenStorage, TokenStorage};
use crate::store::Store;

/// Application state shared across the daemon and CLI commands.
///
/// This struct is cheaply cloneable via `Arc`. The store, cache and clients
/// live exactly as long as the last clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Store,
    cache: Arc<CatalogCache>,
    api: ApiClient,
    realtime: RealtimeClient,
    auth: AuthService,
    catalog: CatalogService,
    wishlist: WishlistService,
    bag: BagService,
    ratings: RatingService,
    checkout: CheckoutService,
    products: ProductAdminService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend_url", &self.inner.config.backend_url.as_str())
            .field("store_version", &self.inner.store.version())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create application state with the token persisted under
    /// `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the bootstrap
    /// token cannot be stored.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let storage = Arc::new(FileTokenStorage::new(config.state_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Create application state over an arbitrary token storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the bootstrap
    /// token cannot be stored.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self, StorefrontError> {
        let store = Store::new();
        let session = Session::new(store.clone(), storage);
        if let Some(token) = &config.bootstrap_token
            && session.access_token().is_none()
        {
            session.persist_tokens(token, None)?;
            tracing::debug!("Bootstrap token stored");
        }

        let cache = Arc::new(CatalogCache::new(config.cache));
        let api = ApiClient::new(
            config.backend_url.clone(),
            session.clone(),
            config.request_timeout,
        )?;
        let realtime = RealtimeClient::new(config.realtime.clone(), session);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                auth: AuthService::new(api.clone(), Arc::clone(&cache), realtime.clone()),
                catalog: CatalogService::new(api.clone(), store.clone(), Arc::clone(&cache)),
                wishlist: WishlistService::new(api.clone(), store.clone()),
                bag: BagService::new(api.clone(), store.clone()),
                ratings: RatingService::new(api.clone(), store.clone(), Arc::clone(&cache)),
                checkout: CheckoutService::new(api.clone(), store.clone(), Arc::clone(&cache)),
                products: ProductAdminService::new(api.clone(), store.clone(), Arc::clone(&cache)),
                config,
                store,
                cache,
                api,
                realtime,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.inner.cache
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn realtime(&self) -> &RealtimeClient {
        &self.inner.realtime
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn bag(&self) -> &BagService {
        &self.inner.bag
    }

    #[must_use]
    pub fn ratings(&self) -> &RatingService {
        &self.inner.ratings
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn products(&self) -> &ProductAdminService {
        &self.inner.products
    }
}
