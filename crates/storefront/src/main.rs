//! BBHCBazaar storefront sync daemon.
//!
//! Keeps a local copy of the catalog in step with the backend: restores the
//! persisted session, loads the catalog (plus wishlist and bag when signed
//! in), then merges realtime pushes until shut down.
//!
//! # Architecture
//!
//! - `reqwest` REST client with transparent token refresh
//! - `tokio-tungstenite` websocket for `product_created`, `product_updated`
//!   and `rating_updated` pushes
//! - In-memory store plus a bounded TTL cache, both owned by [`AppState`]

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::time::Duration;

use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::realtime::ConnectionState;
use bazaar_storefront::{AppState, StorefrontError};
use sentry::integrations::tracing as sentry_tracing;
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

async fn run(config: StorefrontConfig) -> Result<(), StorefrontError> {
    let purge_every = config.cache.max_age;
    let recover_every = config.realtime.restart_delay();
    let state = AppState::new(config)?;
    tracing::info!(backend = %state.config().backend_url, "Storefront daemon starting");

    let subscriptions = state.catalog().attach(state.realtime());
    tracing::debug!(count = subscriptions.len(), "Catalog subscribed to realtime events");

    let mut pending = PendingLoads::default();
    pending.retry(&state).await;
    if let Err(e) = state.realtime().connect() {
        // Guests still get the catalog, just without live updates.
        tracing::info!(error = %e, "Realtime updates disabled");
    }

    sync_until_shutdown(&state, pending, purge_every, recover_every).await;

    state.realtime().disconnect();
    tracing::info!("Storefront daemon stopped");
    Ok(())
}

/// Startup loads that have not succeeded yet. Failures are reported and
/// retried on the recovery tick instead of stopping the daemon.
struct PendingLoads {
    session: bool,
    catalog: bool,
}

impl Default for PendingLoads {
    fn default() -> Self {
        Self {
            session: true,
            catalog: true,
        }
    }
}

impl PendingLoads {
    const fn is_empty(&self) -> bool {
        !self.session && !self.catalog
    }

    async fn retry(&mut self, state: &AppState) {
        if self.session {
            match state.auth().restore().await {
                Ok(user) => {
                    self.session = false;
                    if let Some(user) = user {
                        tracing::info!(user_id = %user.id, user_type = %user.user_type, "Signed in");
                        load_user_data(state).await;
                    }
                }
                Err(e) => e.report(),
            }
        }

        if self.catalog {
            match state.catalog().home_products().await {
                Ok(products) => {
                    self.catalog = false;
                    tracing::info!(products = products.len(), "Catalog loaded");
                }
                Err(e) => StorefrontError::from(e).report(),
            }
        }
    }
}

async fn load_user_data(state: &AppState) {
    if let Err(e) = state.wishlist().load().await {
        StorefrontError::from(e).report();
    }
    if let Err(e) = state.bag().load().await {
        StorefrontError::from(e).report();
    }
}

/// Log store and connection changes, purge stale cache entries, and recover
/// failed loads and a dead realtime connection until a shutdown signal
/// arrives.
async fn sync_until_shutdown(
    state: &AppState,
    mut pending: PendingLoads,
    purge_every: Duration,
    recover_every: Duration,
) {
    let mut versions = state.store().subscribe();
    let mut connection = state.realtime().watch_state();
    let mut purge = tokio::time::interval(purge_every);
    let mut recover = tokio::time::interval_at(Instant::now() + recover_every, recover_every);
    recover.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            Ok(()) = versions.changed() => {
                let version = *versions.borrow_and_update();
                let products = state.store().select(|s| s.data.home.products.len());
                tracing::debug!(version, products, "Store updated");
            }
            Ok(()) = connection.changed() => {
                let current = *connection.borrow_and_update();
                if current == ConnectionState::Disconnected {
                    tracing::warn!("Realtime connection lost");
                }
            }
            _ = purge.tick() => {
                let purged = state.cache().purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Expired cache entries purged");
                }
            }
            _ = recover.tick() => {
                if !pending.is_empty() {
                    pending.retry(state).await;
                }
                state.realtime().revive();
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
