//! Business logic services for the storefront.
//!
//! Each service combines the API client with the store and cache. Mutations
//! the user expects to feel instant (wishlist toggle, bag quantity) are
//! applied locally first and undone if the backend refuses them; the rest
//! wait for the backend before touching local state.
//!
//! # Services
//!
//! - `auth` - Login, logout and session restore
//! - `catalog` - Cached catalog reads and realtime merging
//! - `wishlist` - Optimistic wishlist toggling
//! - `bag` - Bag lines with per-line serialized, optimistic quantity changes
//! - `ratings` - Product ratings
//! - `checkout` - QR pickup orders from the bag
//! - `product_admin` - Seller and master listing management

pub mod auth;
pub mod bag;
pub mod catalog;
pub mod checkout;
mod locks;
pub mod product_admin;
pub mod ratings;
pub mod wishlist;

pub use auth::AuthService;
pub use bag::{BagChange, BagService};
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use product_admin::ProductAdminService;
pub use ratings::RatingService;
pub use wishlist::{WishlistChange, WishlistService};
