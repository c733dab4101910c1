//! Subcommand implementations.
//!
//! Each command writes its human-readable result to the `out` writer it is
//! given and leaves logging to `tracing`, which goes to stderr.

pub mod auth;
pub mod bag;
pub mod catalog;
pub mod listings;
pub mod orders;
pub mod watch;
pub mod wishlist;
