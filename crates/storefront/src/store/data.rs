//! The "data" slice: catalog snapshot, wishlist and home page content.

use bazaar_core::ProductId;
use serde::Serialize;

use super::content::{
    self, CuratedCollection, HeroSlide, NavLink, QuickCategory, RecommendationRow,
    SpotlightProduct,
};
use crate::api::types::{Product, ProductPatch, RatingUpdate};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataState {
    pub loading: bool,
    pub error: Option<String>,
    pub home: HomeState,
}

/// Everything the home page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeState {
    /// Approved catalog, newest first.
    pub products: Vec<Product>,
    /// Wishlisted product IDs, in the order they were added.
    pub wishlist: Vec<ProductId>,
    pub hero_slides: Vec<HeroSlide>,
    pub quick_categories: Vec<QuickCategory>,
    pub curated_collections: Vec<CuratedCollection>,
    pub recommendation_rows: Vec<RecommendationRow>,
    pub spotlight_products: Vec<SpotlightProduct>,
    pub mobile_quick_links: Vec<NavLink>,
    pub bottom_nav_items: Vec<NavLink>,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            wishlist: Vec::new(),
            hero_slides: content::hero_slides(),
            quick_categories: content::quick_categories(),
            curated_collections: content::curated_collections(),
            recommendation_rows: content::recommendation_rows(),
            spotlight_products: content::spotlight_products(),
            mobile_quick_links: content::mobile_quick_links(),
            bottom_nav_items: content::bottom_nav_items(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataAction {
    SetLoading(bool),
    SetError(Option<String>),
    /// Replace the catalog wholesale after a full fetch.
    SetHomeProducts(Vec<Product>),
    /// Replace the wishlist wholesale after a full fetch.
    SetHomeWishlist(Vec<ProductId>),
    /// Remove the ID if present, append it otherwise.
    ToggleWishlist(ProductId),
    /// Replace the product with the same ID in place, or prepend it.
    UpsertProduct(Product),
    /// Overlay fields onto an existing product; ignored when absent.
    PatchProduct(ProductPatch),
    /// Attach a fresh rating aggregate; ignored when absent.
    ApplyRatingStats(RatingUpdate),
    RemoveProduct(ProductId),
}

impl DataAction {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::SetLoading(_) => "data/setLoading",
            Self::SetError(_) => "data/setError",
            Self::SetHomeProducts(_) => "data/setHomeProducts",
            Self::SetHomeWishlist(_) => "data/setHomeWishlist",
            Self::ToggleWishlist(_) => "data/toggleWishlist",
            Self::UpsertProduct(_) => "data/upsertProduct",
            Self::PatchProduct(_) => "data/patchProduct",
            Self::ApplyRatingStats(_) => "data/applyRatingStats",
            Self::RemoveProduct(_) => "data/removeProduct",
        }
    }
}

pub(crate) fn reduce(state: &mut DataState, action: DataAction) {
    match action {
        DataAction::SetLoading(loading) => state.loading = loading,
        DataAction::SetError(error) => state.error = error,
        DataAction::SetHomeProducts(products) => state.home.products = products,
        DataAction::SetHomeWishlist(mut ids) => {
            let mut seen = std::collections::HashSet::new();
            ids.retain(|id| !id.as_str().is_empty() && seen.insert(id.clone()));
            state.home.wishlist = ids;
        }
        DataAction::ToggleWishlist(id) => {
            if id.as_str().is_empty() {
                return;
            }
            let wishlist = &mut state.home.wishlist;
            if let Some(index) = wishlist.iter().position(|w| *w == id) {
                wishlist.remove(index);
            } else {
                wishlist.push(id);
            }
        }
        DataAction::UpsertProduct(product) => {
            let products = &mut state.home.products;
            if let Some(existing) = products.iter_mut().find(|p| p.id == product.id) {
                *existing = product;
            } else {
                products.insert(0, product);
            }
        }
        DataAction::PatchProduct(patch) => {
            if let Some(existing) = state.home.products.iter_mut().find(|p| p.id == patch.id) {
                patch.apply_to(existing);
            }
        }
        DataAction::ApplyRatingStats(update) => {
            if let Some(existing) = state
                .home
                .products
                .iter_mut()
                .find(|p| p.id == update.product_id)
            {
                existing.rating = Some(update.stats);
            }
        }
        DataAction::RemoveProduct(id) => state.home.products.retain(|p| p.id != id),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::Price;

    use super::*;
    use crate::api::types::RatingStats;

    fn product(id: &str, name: &str) -> Product {
        Product::new(id, name, Price::from_rupees(100), Price::from_rupees(120))
    }

    fn ids(state: &DataState) -> Vec<&str> {
        state.home.products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_toggle_wishlist_scenario() {
        let mut state = DataState::default();
        reduce(&mut state, DataAction::ToggleWishlist("42".into()));
        assert_eq!(state.home.wishlist, vec![ProductId::new("42")]);
        reduce(&mut state, DataAction::ToggleWishlist("42".into()));
        assert!(state.home.wishlist.is_empty());
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut state = DataState::default();
        reduce(
            &mut state,
            DataAction::SetHomeWishlist(vec!["1".into(), "2".into(), "3".into()]),
        );
        let original = state.home.wishlist.clone();

        for id in ["2", "9"] {
            reduce(&mut state, DataAction::ToggleWishlist(id.into()));
            reduce(&mut state, DataAction::ToggleWishlist(id.into()));
            let mut now = state.home.wishlist.clone();
            let mut before = original.clone();
            now.sort();
            before.sort();
            assert_eq!(now, before);
        }
    }

    #[test]
    fn test_toggle_ignores_empty_id() {
        let mut state = DataState::default();
        reduce(&mut state, DataAction::ToggleWishlist(ProductId::new("")));
        assert!(state.home.wishlist.is_empty());
    }

    #[test]
    fn test_numeric_ids_normalize_before_membership() {
        let mut state = DataState::default();
        let from_backend: Vec<ProductId> = serde_json::from_str("[42, \"7\"]").unwrap();
        reduce(&mut state, DataAction::SetHomeWishlist(from_backend));
        reduce(&mut state, DataAction::ToggleWishlist("42".into()));
        assert_eq!(state.home.wishlist, vec![ProductId::new("7")]);
    }

    #[test]
    fn test_set_wishlist_dedups() {
        let mut state = DataState::default();
        reduce(
            &mut state,
            DataAction::SetHomeWishlist(vec!["1".into(), "1".into(), "2".into()]),
        );
        assert_eq!(state.home.wishlist.len(), 2);
    }

    #[test]
    fn test_upsert_existing_replaces_in_place() {
        let mut state = DataState::default();
        reduce(
            &mut state,
            DataAction::SetHomeProducts(vec![product("a", "A"), product("b", "B"), product("c", "C")]),
        );
        reduce(&mut state, DataAction::UpsertProduct(product("b", "B2")));

        assert_eq!(ids(&state), vec!["a", "b", "c"]);
        assert_eq!(state.home.products[1].name, "B2");
    }

    #[test]
    fn test_upsert_new_prepends() {
        let mut state = DataState::default();
        reduce(
            &mut state,
            DataAction::SetHomeProducts(vec![product("a", "A"), product("b", "B")]),
        );
        reduce(&mut state, DataAction::UpsertProduct(product("z", "Z")));
        assert_eq!(ids(&state), vec!["z", "a", "b"]);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut state = DataState::default();
        reduce(&mut state, DataAction::SetHomeProducts(vec![product("a", "A"), product("b", "B")]));
        reduce(
            &mut state,
            DataAction::PatchProduct(ProductPatch {
                id: "a".into(),
                selling_price: Some(Price::from_rupees(90)),
                quantity: Some(3),
                ..ProductPatch::default()
            }),
        );

        let a = &state.home.products[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.selling_price, Price::from_rupees(90));
        assert_eq!(a.quantity, Some(3));
        assert_eq!(ids(&state), vec!["a", "b"]);
    }

    #[test]
    fn test_patch_absent_is_ignored() {
        let mut state = DataState::default();
        reduce(
            &mut state,
            DataAction::PatchProduct(ProductPatch {
                id: "nope".into(),
                name: Some("x".into()),
                ..ProductPatch::default()
            }),
        );
        assert!(state.home.products.is_empty());
    }

    #[test]
    fn test_rating_stats_match_by_id() {
        let mut state = DataState::default();
        reduce(&mut state, DataAction::SetHomeProducts(vec![product("a", "A"), product("b", "B")]));
        let stats = RatingStats {
            total_ratings: 3,
            average_rating: 4.0,
            ..RatingStats::default()
        };
        reduce(
            &mut state,
            DataAction::ApplyRatingStats(RatingUpdate {
                product_id: "b".into(),
                stats: stats.clone(),
            }),
        );
        assert_eq!(state.home.products[0].rating, None);
        assert_eq!(state.home.products[1].rating, Some(stats));
    }

    #[test]
    fn test_remove_product() {
        let mut state = DataState::default();
        reduce(&mut state, DataAction::SetHomeProducts(vec![product("a", "A"), product("b", "B")]));
        reduce(&mut state, DataAction::RemoveProduct("a".into()));
        assert_eq!(ids(&state), vec!["b"]);
    }

    #[test]
    fn test_static_content_seeded() {
        let state = DataState::default();
        assert_eq!(state.home.hero_slides.len(), 3);
        assert_eq!(state.home.quick_categories.len(), 6);
        assert!(!state.loading);
    }
}
