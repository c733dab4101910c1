//! Realtime channel for server-pushed catalog events.
//!
//! One [`RealtimeClient`] holds at most one websocket connection task. The
//! first [`RealtimeClient::subscribe`] starts it with the session's current
//! token; later subscriptions share it. Handlers are kept in a registry that
//! outlives individual connections, so anything registered while
//! disconnected starts receiving events once the socket is up.

mod connection;
pub mod events;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub use events::{Frame, PRODUCT_CREATED, PRODUCT_UPDATED, RATING_UPDATED, RealtimeEvent};

use crate::config::RealtimeConfig;
use crate::session::Session;

/// Errors from the realtime channel.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Realtime connection requires a signed-in session")]
    NotAuthenticated,

    #[error("Realtime connection requires a Tokio runtime")]
    NoRuntime,

    #[error("Invalid realtime request: {0}")]
    InvalidRequest(String),

    #[error("Malformed realtime frame: {0}")]
    Decode(String),
}

/// Connection lifecycle, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Handle returned by [`RealtimeClient::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Event callback. Runs on the connection task, so it must not block.
pub type EventHandler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    handlers: HashMap<String, Vec<(SubscriptionId, EventHandler)>>,
}

impl Registry {
    fn handlers_for(&self, event: &str) -> Vec<EventHandler> {
        self.handlers
            .get(event)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

/// State shared between the client handle and its connection task.
struct Shared {
    config: RealtimeConfig,
    session: Session,
    registry: Mutex<Registry>,
    state: watch::Sender<ConnectionState>,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, current = ?state, "Realtime state changed");
        }
    }

    /// Deliver an event to every handler registered for its name.
    fn dispatch(&self, event: &RealtimeEvent) -> usize {
        let handlers = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers_for(event.name());
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

/// Client for the realtime websocket.
///
/// Cheap to clone; clones share the connection and the handler registry.
#[derive(Clone)]
pub struct RealtimeClient {
    shared: Arc<Shared>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.shared.config.url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    #[must_use]
    pub fn new(config: RealtimeConfig, session: Session) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                session,
                registry: Mutex::new(Registry::default()),
                state,
            }),
            task: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Number of registered handlers across all events.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Register `handler` for `event` and make sure a connection is running.
    ///
    /// The handler is kept even when the connection cannot start yet (no
    /// token, or called outside a runtime); a later [`connect`](Self::connect)
    /// picks it up.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(event, subscription = %id, "Subscribed");

        if let Err(e) = self.connect() {
            debug!(error = %e, "Deferring realtime connection");
        }
        id
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        debug!(subscription = %id, removed, "Unsubscribed");
        removed
    }

    /// Start the connection task unless one is already running.
    ///
    /// Returns `Ok(true)` when a new task was started.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::NotAuthenticated`] when the session has no
    /// token, or [`RealtimeError::NoRuntime`] outside a Tokio runtime.
    #[instrument(skip(self), fields(url = %self.shared.config.url))]
    pub fn connect(&self) -> Result<bool, RealtimeError> {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.as_ref()
            && !handle.is_finished()
        {
            return Ok(false);
        }

        if self.shared.session.access_token().is_none() {
            return Err(RealtimeError::NotAuthenticated);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| RealtimeError::NoRuntime)?;

        self.shared.set_state(ConnectionState::Connecting);
        *task = Some(runtime.spawn(connection::run(Arc::clone(&self.shared))));
        info!("Realtime connection task started");
        Ok(true)
    }

    /// Whether a connection task is alive, connected or between attempts.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start a fresh connection task if the previous one gave up.
    ///
    /// Meant to be called periodically by long-running consumers. Returns
    /// whether a new task was started; a missing session is not an error
    /// here, the connection simply stays down until sign-in.
    pub fn revive(&self) -> bool {
        match self.connect() {
            Ok(started) => {
                if started {
                    info!("Realtime connection task restarted");
                }
                started
            }
            Err(e) => {
                debug!(error = %e, "Realtime connection stays down");
                false
            }
        }
    }

    /// Stop the connection task. Registered handlers are kept.
    pub fn disconnect(&self) {
        if let Some(handle) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            info!("Realtime connection closed");
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    /// Deliver an event to local handlers as if the server had pushed it.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit_local(&self, event: &RealtimeEvent) -> usize {
        self.shared.dispatch(event)
    }
}
