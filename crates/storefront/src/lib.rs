//! BBHCBazaar storefront client library.
//!
//! Everything a storefront front end needs short of rendering: the REST
//! client, a bounded TTL cache, the realtime event channel, a single state
//! store and the services that tie them together. Both the sync daemon and
//! the CLI are thin consumers of this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod realtime;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;

pub use error::{Result, StorefrontError};
pub use state::AppState;
