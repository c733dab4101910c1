//! Canonical storefront entities.
//!
//! These are the shapes the rest of the crate works with. The backend's
//! loosely-typed payloads are decoded into them once, in the `conversions`
//! module; nothing downstream looks at wire field aliases.

use std::collections::{BTreeMap, HashMap};

use bazaar_core::{
    ApprovalStatus, BagItemId, CategoryId, OrderId, OrderStatus, Price, ProductId, RatingId,
    SellerId, UserId, UserType, discount_percent,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::ApiError;

// =============================================================================
// Catalog
// =============================================================================

/// Reference from a product to one of its categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Category ID, when the backend sent one.
    pub id: Option<CategoryId>,
    /// Category display name.
    pub name: String,
}

impl CategoryRef {
    /// A category known only by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form specification text.
    pub specification: String,
    /// Ordered highlight bullet points.
    pub highlights: Vec<String>,
    /// Price the seller asks for.
    pub selling_price: Price,
    /// List price shown struck through.
    pub max_price: Price,
    /// Selling price plus category commission, when the backend computed it.
    pub total_price: Option<Price>,
    /// Commission percentage the backend applied, if reported.
    pub commission_rate: Option<Decimal>,
    /// Units available. `None` when the backend did not say.
    pub quantity: Option<u32>,
    /// Thumbnail image reference.
    pub thumbnail: Option<String>,
    /// Ordered gallery image references.
    pub gallery: Vec<String>,
    pub categories: Vec<CategoryRef>,
    /// Seller that owns the listing.
    pub seller_id: Option<SellerId>,
    pub approval_status: ApprovalStatus,
    /// Last known rating aggregate.
    pub rating: Option<RatingStats>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// A minimal listing, mostly useful for tests and optimistic inserts.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, selling: Price, max: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specification: String::new(),
            highlights: Vec::new(),
            selling_price: selling,
            max_price: max,
            total_price: None,
            commission_rate: None,
            quantity: None,
            thumbnail: None,
            gallery: Vec::new(),
            categories: Vec::new(),
            seller_id: None,
            approval_status: ApprovalStatus::Approved,
            rating: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Discount badge percentage, `None` when no badge is shown.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        discount_percent(self.selling_price, self.max_price)
    }

    /// Whether the listing can be added to a bag. Unknown stock counts as
    /// available; the backend rejects the order if it is not.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.quantity.is_none_or(|q| q > 0)
    }

    /// Price the customer pays for one unit.
    ///
    /// Prefers the backend's computed total, then derives one from the
    /// commission table, then falls back to the selling price.
    #[must_use]
    pub fn customer_price(&self, rates: Option<&CommissionRates>) -> Price {
        if let Some(total) = self.total_price {
            return total;
        }
        let rate = self
            .commission_rate
            .or_else(|| rates.and_then(|r| r.rate_for(self)));
        rate.map_or(self.selling_price, |rate| {
            self.selling_price.with_commission(rate)
        })
    }

    /// Whether the product belongs to the named category (case-insensitive)
    /// or the category with this ID.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| {
            c.name.eq_ignore_ascii_case(category)
                || c.id.as_ref().is_some_and(|id| id.as_str() == category)
        })
    }
}

/// Partial product update pushed over the realtime channel.
///
/// Every field except the ID is optional; absent fields leave the stored
/// product untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub id: ProductId,
    pub name: Option<String>,
    pub specification: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub selling_price: Option<Price>,
    pub max_price: Option<Price>,
    pub total_price: Option<Price>,
    pub commission_rate: Option<Decimal>,
    pub quantity: Option<u32>,
    pub thumbnail: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub categories: Option<Vec<CategoryRef>>,
    pub approval_status: Option<ApprovalStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductPatch {
    /// Overlay the present fields onto `product`.
    pub fn apply_to(&self, product: &mut Product) {
        fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        set(&mut product.name, self.name.as_ref());
        set(&mut product.specification, self.specification.as_ref());
        set(&mut product.highlights, self.highlights.as_ref());
        set(&mut product.selling_price, self.selling_price.as_ref());
        set(&mut product.max_price, self.max_price.as_ref());
        set(&mut product.gallery, self.gallery.as_ref());
        set(&mut product.categories, self.categories.as_ref());
        set(&mut product.approval_status, self.approval_status.as_ref());
        if self.total_price.is_some() {
            product.total_price = self.total_price;
        } else if self.selling_price.is_some() {
            // A stale computed total would disagree with the new selling price
            product.total_price = None;
        }
        if self.commission_rate.is_some() {
            product.commission_rate = self.commission_rate;
        }
        if self.quantity.is_some() {
            product.quantity = self.quantity;
        }
        if self.thumbnail.is_some() {
            product.thumbnail.clone_from(&self.thumbnail);
        }
        if self.updated_at.is_some() {
            product.updated_at = self.updated_at;
        }
    }

    /// Whether the patch carries every field a full listing needs, so it can
    /// be inserted when the product is not known yet.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.name.is_some() && self.selling_price.is_some() && self.max_price.is_some()
    }

    /// Build a full product from a complete patch.
    #[must_use]
    pub fn to_product(&self) -> Option<Product> {
        if !self.is_complete() {
            return None;
        }
        let mut product = Product::new(
            self.id.clone(),
            String::new(),
            self.selling_price.unwrap_or_default(),
            self.max_price.unwrap_or_default(),
        );
        self.apply_to(&mut product);
        product.total_price = self.total_price;
        Some(product)
    }
}

impl From<Product> for ProductPatch {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: Some(p.name),
            specification: Some(p.specification),
            highlights: Some(p.highlights),
            selling_price: Some(p.selling_price),
            max_price: Some(p.max_price),
            total_price: p.total_price,
            commission_rate: p.commission_rate,
            quantity: p.quantity,
            thumbnail: p.thumbnail,
            gallery: Some(p.gallery),
            categories: Some(p.categories),
            approval_status: Some(p.approval_status),
            updated_at: p.updated_at,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Commission percentage added on top of seller prices.
    pub commission_rate: Option<Decimal>,
}

/// Commission percentages by category.
///
/// Looked up by category ID or by lowercased category name, since product
/// payloads reference categories either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    rates: HashMap<String, Decimal>,
}

impl CommissionRates {
    /// Build from `(category id, category name, rate)` rows.
    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = (Option<&'a str>, Option<&'a str>, Decimal)>,
    ) -> Self {
        let mut rates = HashMap::new();
        for (id, name, rate) in rows {
            if let Some(id) = id {
                rates.insert(id.to_string(), rate);
            }
            if let Some(name) = name {
                rates.insert(name.trim().to_lowercase(), rate);
            }
        }
        Self { rates }
    }

    /// Rate for a single category.
    #[must_use]
    pub fn rate(&self, category: &CategoryRef) -> Option<Decimal> {
        category
            .id
            .as_ref()
            .and_then(|id| self.rates.get(id.as_str()))
            .or_else(|| self.rates.get(&category.name.trim().to_lowercase()))
            .copied()
    }

    /// Rate applied to a product: the highest rate among its categories.
    #[must_use]
    pub fn rate_for(&self, product: &Product) -> Option<Decimal> {
        product.categories.iter().filter_map(|c| self.rate(c)).max()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// Aggregate rating for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    pub total_ratings: u32,
    /// Mean star value, `0.0` when unrated.
    pub average_rating: f64,
    /// Count per star value 1..=5.
    pub star_distribution: BTreeMap<u8, u32>,
}

/// Rating aggregate pushed over the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub product_id: ProductId,
    pub stats: RatingStats,
}

/// A customer's rating of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Option<RatingId>,
    pub product_id: ProductId,
    /// Star value, 1..=5.
    pub rating: u8,
    pub review_text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Bag
// =============================================================================

/// One line in the customer's bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagItem {
    pub id: BagItemId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    /// Product snapshot the backend attached to the line.
    pub product: Option<Product>,
}

impl BagItem {
    /// Unit price the customer pays, zero when no snapshot is attached.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.product
            .as_ref()
            .map_or(Price::ZERO, |p| p.customer_price(None))
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// Request body for adding a product to the bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBagItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl NewBagItem {
    /// One unit with no variant selection.
    #[must_use]
    pub const fn single(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 1,
            selected_size: None,
            selected_color: None,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A QR pickup order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing number printed on the pickup slip.
    pub order_number: Option<String>,
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    pub status: OrderStatus,
    pub total_amount: Option<Price>,
    /// Payload encoded in the pickup QR code.
    pub qr_code_data: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    /// Where the order was placed from, e.g. `bag` or `buy_now`.
    pub source: &'static str,
    pub platform: &'static str,
}

impl NewOrder {
    /// Order everything in a bag line.
    #[must_use]
    pub fn from_bag_item(item: &BagItem, pickup_location: Option<String>) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            selected_size: item.selected_size.clone(),
            selected_color: item.selected_color.clone(),
            delivery_address: None,
            pickup_location,
            source: "bag",
            platform: "cli",
        }
    }
}

// =============================================================================
// Seller / master product management
// =============================================================================

/// Listing fields a seller submits when creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    #[serde(rename = "product_name")]
    pub name: String,
    pub specification: String,
    #[serde(rename = "points")]
    pub highlights: Vec<String>,
    pub selling_price: Price,
    pub max_price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub gallery: Vec<String>,
    /// Category names.
    pub categories: Vec<String>,
}

impl ProductDraft {
    /// Check the draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank name or an invalid
    /// price pair.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Product name is required"));
        }
        Price::validate_pair(self.selling_price, self.max_price)
            .map_err(|e| ApiError::validation(e.to_string()))
    }
}

/// Filters for the product listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        [("category", &self.category), ("search", &self.search)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v.to_string()))
            })
            .collect()
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub user_type: UserType,
}

/// Sign-up details for a new customer account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    /// Defaults to the email's local part on the backend.
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Registration {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}
