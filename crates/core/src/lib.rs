//! BBHCBazaar Core - Shared domain types.
//!
//! This crate provides common types used across all storefront components:
//! - `storefront` - Client library and realtime sync daemon
//! - `cli` - Command-line front end for browsing, wishlist, bag and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no caches. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifier newtypes, prices and discounts, statuses, emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
