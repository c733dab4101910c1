//! Wire payload normalization.
//!
//! The backend's JSON has grown several spellings for the same field over
//! time (`product_name`/`name`, `points`/`highlights`, four different stock
//! counters, numeric or string IDs). Everything is resolved here, once, into
//! the canonical types in [`super::types`].

use std::collections::BTreeMap;
use std::str::FromStr;

use bazaar_core::{
    ApprovalStatus, BagItemId, CategoryId, OrderId, OrderStatus, Price, ProductId, RatingId,
    SellerId, UserId, UserType,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::ApiError;
use super::types::{
    BagItem, Category, CategoryRef, CommissionRates, Order, Product, ProductPatch, Rating,
    RatingStats, RatingUpdate, User,
};

/// Stock field spellings, in priority order.
const QUANTITY_ALIASES: [&str; 5] = [
    "quantity",
    "available_quantity",
    "stock",
    "inventory",
    "stock_quantity",
];

// =============================================================================
// Scalar helpers
// =============================================================================

/// Take `key` out of a response envelope such as `{"products": [...]}`.
///
/// Bare payloads are returned unchanged.
pub fn unwrap_envelope(value: Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in keys {
                if let Some(inner) = map.remove(*key) {
                    return inner;
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Decode a DTO, mapping failures to [`ApiError::Parse`].
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(format!("{what}: {e}")))
}

/// String or integer identifier, trimmed. Mongo `{"$oid": ...}` is accepted.
pub fn wire_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(wire_id),
        _ => None,
    }
}

/// Decimal from a JSON number or numeric string.
pub fn wire_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn wire_price(value: Option<&Value>) -> Option<Price> {
    value.and_then(wire_decimal).map(Price::new)
}

/// Non-negative count from a number or numeric string. Fractions are
/// truncated, negatives clamp to zero.
pub fn wire_count(value: &Value) -> Option<u32> {
    let decimal = wire_decimal(value)?;
    if decimal.is_sign_negative() {
        return Some(0);
    }
    decimal.trunc().to_u32()
}

/// First usable stock counter among the known aliases. Aliases holding
/// null or a non-numeric value are skipped.
pub fn wire_quantity(map: &serde_json::Map<String, Value>) -> Option<u32> {
    QUANTITY_ALIASES
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(wire_count)
}

/// ISO-8601 timestamp. Naive timestamps are taken as UTC.
pub fn wire_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = value?.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn wire_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn wire_strings(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| wire_string(Some(v)))
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.clone()]),
        Value::String(_) | Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn first<'a>(map: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn entity_id(map: &serde_json::Map<String, Value>) -> Option<String> {
    first(map, &["id", "_id"]).and_then(wire_id)
}

fn as_object(value: &Value, what: &str) -> Result<serde_json::Map<String, Value>, ApiError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::Parse(format!("{what}: expected an object")))
}

/// Convert every element of a JSON array, dropping (and logging) the ones
/// that do not decode.
fn convert_list<T>(
    value: Value,
    what: &str,
    convert: impl Fn(&Value) -> Result<T, ApiError>,
) -> Result<Vec<T>, ApiError> {
    let Value::Array(items) = value else {
        if value.is_null() {
            return Ok(Vec::new());
        }
        return Err(ApiError::Parse(format!("{what}: expected a list")));
    };
    Ok(items
        .iter()
        .filter_map(|item| match convert(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, entity = what, "Skipping malformed entry");
                None
            }
        })
        .collect())
}

// =============================================================================
// Catalog
// =============================================================================

/// Categories as a list of names, a list of `{id, name}` objects, or one name.
pub fn convert_categories(value: Option<&Value>) -> Option<Vec<CategoryRef>> {
    match value? {
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CategoryRef::named)
                .collect(),
        ),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => {
                        Some(CategoryRef::named(s.trim()))
                    }
                    Value::Object(map) => {
                        let id = entity_id(map).map(CategoryId::new);
                        let name = wire_string(first(map, &["name", "category_name"]))
                            .or_else(|| id.as_ref().map(ToString::to_string))?;
                        Some(CategoryRef { id, name })
                    }
                    _ => None,
                })
                .collect(),
        ),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn convert_embedded_rating(map: &serde_json::Map<String, Value>) -> Option<RatingStats> {
    if let Some(stats) = first(map, &["rating_stats", "ratings"]).filter(|v| v.is_object()) {
        return convert_rating_stats(stats).ok();
    }
    let average = first(map, &["average_rating"])?;
    Some(RatingStats {
        total_ratings: first(map, &["total_ratings", "rating_count"])
            .and_then(wire_count)
            .unwrap_or_default(),
        average_rating: wire_decimal(average)
            .and_then(|d| d.to_string().parse().ok())
            .unwrap_or_default(),
        star_distribution: BTreeMap::new(),
    })
}

/// Decode a product patch: every field optional except the ID.
pub fn convert_product_patch(value: &Value) -> Result<ProductPatch, ApiError> {
    let map = as_object(value, "product")?;
    let id = entity_id(&map)
        .map(ProductId::new)
        .ok_or_else(|| ApiError::Parse("product: missing id".to_string()))?;

    Ok(ProductPatch {
        id,
        name: wire_string(first(&map, &["product_name", "name"])),
        specification: first(&map, &["specification", "description"])
            .and_then(Value::as_str)
            .map(str::to_string),
        highlights: wire_strings(first(&map, &["points", "highlights"])),
        selling_price: wire_price(map.get("selling_price")),
        max_price: wire_price(map.get("max_price")),
        total_price: wire_price(first(&map, &["total_selling_price", "total_price"])),
        commission_rate: map.get("commission_rate").and_then(wire_decimal),
        quantity: wire_quantity(&map),
        thumbnail: wire_string(map.get("thumbnail")),
        gallery: wire_strings(map.get("gallery")),
        categories: convert_categories(first(&map, &["categories", "category"])),
        approval_status: map
            .get("approval_status")
            .and_then(|v| serde_json::from_value::<ApprovalStatus>(v.clone()).ok()),
        updated_at: wire_timestamp(map.get("updated_at")),
    })
}

/// Decode a full product. Missing optional fields take neutral defaults.
pub fn convert_product(value: &Value) -> Result<Product, ApiError> {
    let map = as_object(value, "product")?;
    let patch = convert_product_patch(value)?;

    let mut product = Product::new(
        patch.id.clone(),
        String::new(),
        patch.selling_price.unwrap_or(Price::ZERO),
        patch.max_price.or(patch.selling_price).unwrap_or(Price::ZERO),
    );
    patch.apply_to(&mut product);
    product.total_price = patch.total_price;
    product.seller_id = first(&map, &["seller_id", "created_by_user_id"])
        .and_then(wire_id)
        .map(SellerId::new);
    product.rating = convert_embedded_rating(&map);
    product.created_at = wire_timestamp(map.get("created_at"));
    Ok(product)
}

/// Product list from `{"products": [...]}` or a bare list.
pub fn convert_products(value: Value) -> Result<Vec<Product>, ApiError> {
    convert_list(
        unwrap_envelope(value, &["products", "data"]),
        "product",
        convert_product,
    )
}

pub fn convert_category(value: &Value) -> Result<Category, ApiError> {
    let map = as_object(value, "category")?;
    let name = wire_string(first(&map, &["name", "category_name"]))
        .ok_or_else(|| ApiError::Parse("category: missing name".to_string()))?;
    Ok(Category {
        id: CategoryId::new(entity_id(&map).unwrap_or_else(|| name.clone())),
        description: wire_string(map.get("description")),
        commission_rate: first(&map, &["commission_rate", "commission"]).and_then(wire_decimal),
        name,
    })
}

pub fn convert_category_list(value: Value) -> Result<Vec<Category>, ApiError> {
    convert_list(
        unwrap_envelope(value, &["categories"]),
        "category",
        convert_category,
    )
}

/// Commission table from a list of rows or a `{name: rate}` map.
pub fn convert_commissions(value: Value) -> Result<CommissionRates, ApiError> {
    match unwrap_envelope(value, &["commissions", "commission_rates", "categories"]) {
        Value::Array(rows) => {
            let parsed: Vec<(Option<String>, Option<String>, Decimal)> = rows
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|row| {
                    let rate = first(row, &["commission_rate", "rate", "commission"])
                        .and_then(wire_decimal)?;
                    let id = first(row, &["category_id", "id", "_id"]).and_then(wire_id);
                    let name = wire_string(first(row, &["category_name", "name", "category"]));
                    Some((id, name, rate))
                })
                .collect();
            Ok(CommissionRates::from_rows(
                parsed
                    .iter()
                    .map(|(id, name, rate)| (id.as_deref(), name.as_deref(), *rate)),
            ))
        }
        Value::Object(map) => Ok(CommissionRates::from_rows(
            map.iter()
                .filter_map(|(name, v)| Some((None, Some(name.as_str()), wire_decimal(v)?))),
        )),
        Value::Null => Ok(CommissionRates::default()),
        _ => Err(ApiError::Parse("commissions: expected a list".to_string())),
    }
}

// =============================================================================
// Ratings
// =============================================================================

pub fn convert_rating_stats(value: &Value) -> Result<RatingStats, ApiError> {
    let map = as_object(value, "rating stats")?;
    let star_distribution = map
        .get("star_distribution")
        .and_then(Value::as_object)
        .map(|dist| {
            dist.iter()
                .filter_map(|(star, count)| {
                    let star = star.parse::<u8>().ok().filter(|s| (1..=5).contains(s))?;
                    Some((star, wire_count(count)?))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RatingStats {
        total_ratings: first(&map, &["total_ratings", "count", "rating_count"])
            .and_then(wire_count)
            .unwrap_or_default(),
        average_rating: first(&map, &["average_rating", "average"])
            .and_then(Value::as_f64)
            .or_else(|| {
                first(&map, &["average_rating", "average"])
                    .and_then(Value::as_str)
                    .and_then(|s| s.trim().parse().ok())
            })
            .unwrap_or_default(),
        star_distribution,
    })
}

/// `rating_updated` payload: `{product_id, stats}` or the stats flattened
/// next to `product_id`.
pub fn convert_rating_update(value: &Value) -> Result<RatingUpdate, ApiError> {
    let map = as_object(value, "rating update")?;
    let product_id = first(&map, &["product_id", "productId", "id"])
        .and_then(wire_id)
        .map(ProductId::new)
        .ok_or_else(|| ApiError::Parse("rating update: missing product_id".to_string()))?;
    let stats = match map.get("stats").filter(|v| v.is_object()) {
        Some(stats) => convert_rating_stats(stats)?,
        None => convert_rating_stats(value)?,
    };
    Ok(RatingUpdate { product_id, stats })
}

pub fn convert_rating(value: &Value, product_id: &ProductId) -> Result<Rating, ApiError> {
    let map = as_object(value, "rating")?;
    let stars = map
        .get("rating")
        .and_then(wire_count)
        .and_then(|r| u8::try_from(r).ok())
        .ok_or_else(|| ApiError::Parse("rating: missing rating value".to_string()))?;
    Ok(Rating {
        id: entity_id(&map).map(RatingId::new),
        product_id: map
            .get("product_id")
            .and_then(wire_id)
            .map_or_else(|| product_id.clone(), ProductId::new),
        rating: stars,
        review_text: wire_string(map.get("review_text")),
        created_at: wire_timestamp(map.get("created_at")),
    })
}

// =============================================================================
// Bag and wishlist
// =============================================================================

pub fn convert_bag_item(value: &Value) -> Result<BagItem, ApiError> {
    let map = as_object(value, "bag item")?;
    let id = entity_id(&map)
        .map(BagItemId::new)
        .ok_or_else(|| ApiError::Parse("bag item: missing id".to_string()))?;

    let product = map
        .get("product")
        .and_then(Value::as_object)
        .and_then(|snapshot| {
            let mut snapshot = snapshot.clone();
            // Snapshots sometimes omit their own id
            if entity_id(&snapshot).is_none()
                && let Some(pid) = map.get("product_id")
            {
                snapshot.insert("id".to_string(), pid.clone());
            }
            convert_product(&Value::Object(snapshot)).ok()
        });

    let product_id = map
        .get("product_id")
        .and_then(wire_id)
        .map(ProductId::new)
        .or_else(|| product.as_ref().map(|p| p.id.clone()))
        .ok_or_else(|| ApiError::Parse("bag item: missing product_id".to_string()))?;

    Ok(BagItem {
        id,
        product_id,
        quantity: map.get("quantity").and_then(wire_count).unwrap_or(1).max(1),
        selected_size: wire_string(map.get("selected_size")),
        selected_color: wire_string(map.get("selected_color")),
        product,
    })
}

pub fn convert_bag(value: Value) -> Result<Vec<BagItem>, ApiError> {
    convert_list(
        unwrap_envelope(value, &["bag_items", "items", "bag"]),
        "bag item",
        convert_bag_item,
    )
}

/// Wishlist product IDs. Entries may be bare IDs or objects carrying
/// `product_id` (or a nested product).
pub fn convert_wishlist(value: Value) -> Result<Vec<ProductId>, ApiError> {
    convert_list(
        unwrap_envelope(value, &["wishlist", "items", "product_ids"]),
        "wishlist entry",
        |entry| {
            let id = match entry {
                Value::Object(map) => first(map, &["product_id", "productId"])
                    .and_then(wire_id)
                    .or_else(|| {
                        map.get("product")
                            .and_then(Value::as_object)
                            .and_then(entity_id)
                    })
                    .or_else(|| entity_id(map)),
                other => wire_id(other),
            };
            id.map(ProductId::new)
                .ok_or_else(|| ApiError::Parse("wishlist entry: missing product id".to_string()))
        },
    )
}

// =============================================================================
// Orders and accounts
// =============================================================================

pub fn convert_order(value: &Value) -> Result<Order, ApiError> {
    let map = as_object(value, "order")?;
    let id = entity_id(&map)
        .or_else(|| wire_string(map.get("order_number")))
        .map(OrderId::new)
        .ok_or_else(|| ApiError::Parse("order: missing id".to_string()))?;

    let product_id = map
        .get("product_id")
        .and_then(wire_id)
        .or_else(|| {
            first(&map, &["product_snapshot", "product"])
                .and_then(Value::as_object)
                .and_then(entity_id)
        })
        .map(ProductId::new);

    Ok(Order {
        id,
        order_number: wire_string(map.get("order_number")),
        product_id,
        quantity: map.get("quantity").and_then(wire_count).unwrap_or(1),
        status: map
            .get("status")
            .and_then(|v| serde_json::from_value::<OrderStatus>(v.clone()).ok())
            .unwrap_or_default(),
        total_amount: wire_price(first(&map, &["total_amount", "total_price", "amount"])),
        qr_code_data: wire_string(map.get("qr_code_data")),
        created_at: wire_timestamp(map.get("created_at")),
    })
}

pub fn convert_orders(value: Value) -> Result<Vec<Order>, ApiError> {
    convert_list(unwrap_envelope(value, &["orders"]), "order", convert_order)
}

pub fn convert_user(value: &Value) -> Result<User, ApiError> {
    let map = as_object(value, "user")?;
    let id = entity_id(&map)
        .map(UserId::new)
        .ok_or_else(|| ApiError::Parse("user: missing id".to_string()))?;

    let full_name = [map.get("first_name"), map.get("last_name")]
        .into_iter()
        .filter_map(wire_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let name = (!full_name.is_empty())
        .then_some(full_name)
        .or_else(|| wire_string(first(&map, &["name", "username"])));

    Ok(User {
        id,
        email: wire_string(map.get("email")),
        name,
        user_type: first(&map, &["user_type", "role"])
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<UserType>().ok())
            .unwrap_or_default(),
    })
}

/// Token pair returned by login.
#[derive(Debug, Deserialize)]
pub struct TokenDto {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_quantity_alias_priority() {
        let p = convert_product(&json!({"id": "1", "stock": 4, "available_quantity": "7"})).unwrap();
        assert_eq!(p.quantity, Some(7));

        let p = convert_product(&json!({"id": "1", "inventory": 3})).unwrap();
        assert_eq!(p.quantity, Some(3));

        let p = convert_product(&json!({"id": "1", "quantity": null, "stock_quantity": 2.9})).unwrap();
        assert_eq!(p.quantity, Some(2));

        let p = convert_product(&json!({"id": "1"})).unwrap();
        assert_eq!(p.quantity, None);
        assert!(p.in_stock());
    }

    #[test]
    fn test_unparseable_quantity_falls_through_to_next_alias() {
        let p = convert_product(&json!({"id": "1", "quantity": "n/a", "stock": 4})).unwrap();
        assert_eq!(p.quantity, Some(4));

        let p = convert_product(&json!({"id": "1", "quantity": "", "inventory": [1]})).unwrap();
        assert_eq!(p.quantity, None);
    }

    #[test]
    fn test_product_field_aliases() {
        let p = convert_product(&json!({
            "_id": 42,
            "name": "Kurta",
            "highlights": ["Cotton"],
            "selling_price": "749.50",
            "max_price": 1000,
            "total_selling_price": 787,
            "categories": [{"_id": "c1", "name": "Fashion"}, "Men"],
            "created_by_user_id": "s9",
            "created_at": "2024-05-01T10:00:00.123456",
            "approval_status": "pending"
        }))
        .unwrap();

        assert_eq!(p.id.as_str(), "42");
        assert_eq!(p.name, "Kurta");
        assert_eq!(p.highlights, vec!["Cotton"]);
        assert_eq!(p.selling_price.amount(), dec("749.50"));
        assert_eq!(p.total_price.unwrap().amount(), dec("787"));
        assert_eq!(p.categories.len(), 2);
        assert_eq!(p.categories[0].id.as_ref().unwrap().as_str(), "c1");
        assert_eq!(p.categories[1].name, "Men");
        assert_eq!(p.seller_id.unwrap().as_str(), "s9");
        assert!(p.created_at.is_some());
        assert_eq!(p.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_product_name_preferred_over_name() {
        let p = convert_product(&json!({"id": "1", "product_name": "A", "name": "B"})).unwrap();
        assert_eq!(p.name, "A");
    }

    #[test]
    fn test_missing_max_price_falls_back_to_selling() {
        let p = convert_product(&json!({"id": "1", "selling_price": 500})).unwrap();
        assert_eq!(p.max_price, p.selling_price);
        assert_eq!(p.discount_percent(), None);
    }

    #[test]
    fn test_product_without_id_rejected() {
        assert!(matches!(
            convert_product(&json!({"product_name": "x"})),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_product_list_skips_bad_entries() {
        let list = convert_products(json!({"products": [{"id": "1"}, {"name": "no id"}, 7]})).unwrap();
        assert_eq!(list.len(), 1);

        let bare = convert_products(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let patch = convert_product_patch(&json!({"id": "1", "selling_price": 90})).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.selling_price, Some(Price::from_rupees(90)));
        assert!(!patch.is_complete());
    }

    #[test]
    fn test_rating_update_shapes() {
        let nested = convert_rating_update(&json!({
            "product_id": 5,
            "stats": {"total_ratings": 2, "average_rating": 4.5, "star_distribution": {"4": 1, "5": 1}}
        }))
        .unwrap();
        assert_eq!(nested.product_id.as_str(), "5");
        assert_eq!(nested.stats.total_ratings, 2);
        assert_eq!(nested.stats.star_distribution.get(&5), Some(&1));

        let flat = convert_rating_update(&json!({"product_id": "5", "average_rating": "3.0", "total_ratings": 1}))
            .unwrap();
        assert!((flat.stats.average_rating - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bag_snapshot_borrows_product_id() {
        let items = convert_bag(json!({
            "bag_items": [{
                "id": "b1",
                "product_id": "p1",
                "quantity": "2",
                "selected_size": "M",
                "product": {"product_name": "Shirt", "selling_price": 100, "max_price": 120, "stock": 5}
            }],
            "count": 1
        }))
        .unwrap();
        let item = &items[0];
        assert_eq!(item.quantity, 2);
        assert_eq!(item.selected_size.as_deref(), Some("M"));
        let product = item.product.as_ref().unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.quantity, Some(5));
        assert_eq!(item.line_total(), Price::from_rupees(200));
    }

    #[test]
    fn test_wishlist_entry_shapes() {
        let ids = convert_wishlist(json!({"wishlist": [
            "1", 2, {"product_id": 3}, {"product": {"id": "4"}}
        ]}))
        .unwrap();
        let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_commission_rows_and_map() {
        let rates = convert_commissions(json!({"commissions": [
            {"category_id": "c1", "category_name": "Fashion", "commission_rate": 5},
            {"name": "Electronics", "rate": "12.5"}
        ]}))
        .unwrap();
        assert_eq!(rates.rate(&CategoryRef::named("fashion")), Some(dec("5")));
        assert_eq!(rates.rate(&CategoryRef::named("Electronics")), Some(dec("12.5")));

        let map = convert_commissions(json!({"Books": 3})).unwrap();
        assert_eq!(map.rate(&CategoryRef::named("books")), Some(dec("3")));
    }

    #[test]
    fn test_order_and_user() {
        let order = convert_order(&json!({
            "id": "o1",
            "order_number": "BB-1001",
            "product_id": "p1",
            "quantity": 2,
            "status": "pending",
            "qr_code_data": "BBHCBazaar|ORDER:BB-1001"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_number.as_deref(), Some("BB-1001"));

        let user = convert_user(&json!({
            "_id": "u1", "first_name": "Asha", "last_name": " Rao ", "email": "a@b.in", "user_type": "user"
        }))
        .unwrap();
        assert_eq!(user.name.as_deref(), Some("Asha Rao"));
        assert_eq!(user.user_type, UserType::User);
    }

    #[test]
    fn test_envelope_passthrough() {
        assert_eq!(unwrap_envelope(json!([1]), &["products"]), json!([1]));
        assert_eq!(unwrap_envelope(json!({"user": {"id": 1}}), &["user"]), json!({"id": 1}));
    }
}
