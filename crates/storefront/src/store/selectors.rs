//! Read-only views over [`RootState`](super::RootState).

use bazaar_core::{Price, ProductId};

use super::RootState;
use crate::api::types::{CommissionRates, Product};

/// Case-insensitive multi-term product search.
///
/// Every whitespace-separated term must appear in the name, specification,
/// a highlight or a category name. A blank query matches everything.
#[must_use]
pub fn product_matches(product: &Product, query: &str) -> bool {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return true;
    }

    let haystack = std::iter::once(product.name.as_str())
        .chain(std::iter::once(product.specification.as_str()))
        .chain(product.highlights.iter().map(String::as_str))
        .chain(product.categories.iter().map(|c| c.name.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    terms.iter().all(|term| haystack.contains(term.as_str()))
}

/// Catalog products matching `query`, in catalog order.
#[must_use]
pub fn search_products<'a>(state: &'a RootState, query: &str) -> Vec<&'a Product> {
    state
        .data
        .home
        .products
        .iter()
        .filter(|p| product_matches(p, query))
        .collect()
}

/// Catalog products in a category (by name, case-insensitive, or by ID).
#[must_use]
pub fn products_in_category<'a>(state: &'a RootState, category: &str) -> Vec<&'a Product> {
    state
        .data
        .home
        .products
        .iter()
        .filter(|p| p.in_category(category))
        .collect()
}

/// Catalog products whose customer price lies in `[min, max]`. Either bound
/// may be open.
#[must_use]
pub fn products_in_price_range<'a>(
    state: &'a RootState,
    min: Option<Price>,
    max: Option<Price>,
    rates: Option<&CommissionRates>,
) -> Vec<&'a Product> {
    state
        .data
        .home
        .products
        .iter()
        .filter(|p| {
            let price = p.customer_price(rates);
            min.is_none_or(|m| price >= m) && max.is_none_or(|m| price <= m)
        })
        .collect()
}

/// Look up a catalog product.
#[must_use]
pub fn product<'a>(state: &'a RootState, id: &ProductId) -> Option<&'a Product> {
    state.data.home.products.iter().find(|p| p.id == *id)
}

#[must_use]
pub fn is_wishlisted(state: &RootState, id: &ProductId) -> bool {
    state.data.home.wishlist.contains(id)
}

/// Wishlisted products that are in the current catalog snapshot.
#[must_use]
pub fn wishlist_products(state: &RootState) -> Vec<&Product> {
    state
        .data
        .home
        .wishlist
        .iter()
        .filter_map(|id| product(state, id))
        .collect()
}

/// Bag summary shown at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BagTotals {
    /// Number of distinct lines.
    pub lines: usize,
    /// Sum of quantities.
    pub units: u32,
    /// What the customer pays.
    pub total: Price,
    /// Sum of list prices, for the struck-through figure.
    pub list_total: Price,
}

impl BagTotals {
    /// Amount saved against list prices, never negative.
    #[must_use]
    pub fn savings(&self) -> Price {
        bazaar_core::savings(self.total, self.list_total)
    }
}

#[must_use]
pub fn bag_totals(state: &RootState) -> BagTotals {
    state
        .bag
        .items
        .iter()
        .fold(BagTotals::default(), |mut acc, item| {
            acc.lines += 1;
            acc.units = acc.units.saturating_add(item.quantity);
            acc.total = acc.total + item.line_total();
            let list = item
                .product
                .as_ref()
                .map_or(Price::ZERO, |p| p.max_price.max(p.customer_price(None)));
            acc.list_total = acc.list_total + list.times(item.quantity);
            acc
        })
}

/// Badge text such as `25% off`, `None` when no discount applies.
#[must_use]
pub fn discount_badge(product: &Product) -> Option<String> {
    product.discount_percent().map(|pct| format!("{pct}% off"))
}

#[cfg(test)]
mod tests {
    use bazaar_core::BagItemId;

    use super::*;
    use crate::api::types::{BagItem, CategoryRef};

    fn catalog() -> RootState {
        let mut kurta = Product::new("1", "Cotton Kurta", Price::from_rupees(750), Price::from_rupees(1000));
        kurta.highlights = vec!["Hand block printed".into()];
        kurta.categories = vec![CategoryRef::named("Fashion")];

        let mut lamp = Product::new("2", "Desk Lamp", Price::from_rupees(1200), Price::from_rupees(1200));
        lamp.specification = "Warm LED, USB powered".into();
        lamp.categories = vec![CategoryRef::named("Home & Decor")];

        let mut state = RootState::default();
        state.data.home.products = vec![kurta, lamp];
        state
    }

    fn names(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_search_requires_every_term() {
        let state = catalog();
        assert_eq!(names(&search_products(&state, "kurta")), vec!["Cotton Kurta"]);
        assert_eq!(names(&search_products(&state, "LED lamp")), vec!["Desk Lamp"]);
        assert_eq!(names(&search_products(&state, "block fashion")), vec!["Cotton Kurta"]);
        assert!(search_products(&state, "kurta lamp").is_empty());
        assert_eq!(search_products(&state, "   ").len(), 2);
    }

    #[test]
    fn test_category_filter() {
        let state = catalog();
        assert_eq!(names(&products_in_category(&state, "fashion")), vec!["Cotton Kurta"]);
        assert!(products_in_category(&state, "Books").is_empty());
    }

    #[test]
    fn test_price_range() {
        let state = catalog();
        let cheap = products_in_price_range(&state, None, Some(Price::from_rupees(1000)), None);
        assert_eq!(names(&cheap), vec!["Cotton Kurta"]);
        let all = products_in_price_range(&state, Some(Price::from_rupees(750)), None, None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_discount_badge() {
        let state = catalog();
        let products = &state.data.home.products;
        assert_eq!(discount_badge(&products[0]).as_deref(), Some("25% off"));
        assert_eq!(discount_badge(&products[1]), None);
    }

    #[test]
    fn test_wishlist_membership() {
        let mut state = catalog();
        state.data.home.wishlist = vec!["2".into(), "99".into()];
        assert!(is_wishlisted(&state, &"2".into()));
        assert!(!is_wishlisted(&state, &"1".into()));
        assert_eq!(names(&wishlist_products(&state)), vec!["Desk Lamp"]);
    }

    #[test]
    fn test_bag_totals() {
        let mut state = catalog();
        let products = state.data.home.products.clone();
        state.bag.items = products
            .into_iter()
            .enumerate()
            .map(|(i, p)| BagItem {
                id: BagItemId::new(format!("b{i}")),
                product_id: p.id.clone(),
                quantity: 2,
                selected_size: None,
                selected_color: None,
                product: Some(p),
            })
            .collect();

        let totals = bag_totals(&state);
        assert_eq!(totals.lines, 2);
        assert_eq!(totals.units, 4);
        assert_eq!(totals.total, Price::from_rupees(3900));
        assert_eq!(totals.list_total, Price::from_rupees(4400));
        assert_eq!(totals.savings(), Price::from_rupees(500));
    }
}
