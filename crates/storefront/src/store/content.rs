//! Static marketing content for the home page.
//!
//! Seeded into the data slice on startup; the backend does not serve it.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroSlide {
    pub id: &'static str,
    pub eyebrow: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub cta: &'static str,
    pub cta_link: &'static str,
    pub image: &'static str,
    /// Gradient overlay classes.
    pub accent: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickCategory {
    pub label: &'static str,
    pub link: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuratedCollection {
    pub title: &'static str,
    pub tagline: &'static str,
    pub link: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRow {
    pub id: &'static str,
    pub title: &'static str,
    pub link: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotlightProduct {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub cta: &'static str,
    pub link: &'static str,
    pub image: &'static str,
}

/// Icon link in the mobile quick bar or bottom navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub icon: &'static str,
    pub is_active: bool,
}

impl NavLink {
    const fn new(label: &'static str, icon: &'static str) -> Self {
        Self {
            label,
            icon,
            is_active: false,
        }
    }
}

#[must_use]
pub fn hero_slides() -> Vec<HeroSlide> {
    vec![
        HeroSlide {
            id: "slide-1",
            eyebrow: "Festival Specials",
            title: "BBHCBazaar Mega Sale",
            subtitle: "Exclusive collections across decor, food essentials, gadgets and more.",
            cta: "Shop curated picks",
            cta_link: "/collections/festival",
            image: "https://images.unsplash.com/photo-1441984904996-e0b6ba687e04?auto=format&fit=crop&w=1500&q=80",
            accent: "from-rose-500/90 to-orange-400/80",
        },
        HeroSlide {
            id: "slide-2",
            eyebrow: "Work • Play • Repeat",
            title: "Cozy corners & creator desks",
            subtitle: "Ergonomic furniture, ambient lighting and desk essentials built for flow.",
            cta: "Build your setup",
            cta_link: "/collections/studio",
            image: "https://images.unsplash.com/photo-1505691938895-1758d7feb511?auto=format&fit=crop&w=1500&q=80",
            accent: "from-blue-600/80 to-sky-400/70",
        },
        HeroSlide {
            id: "slide-3",
            eyebrow: "Kitchen Lab",
            title: "Smart cookware brings flavour & precision",
            subtitle: "Top-rated appliances picked by chefs across BBHC community households.",
            cta: "Cook with confidence",
            cta_link: "/collections/kitchen",
            image: "https://images.unsplash.com/photo-1504674900247-0877df9cc836?auto=format&fit=crop&w=1500&q=80",
            accent: "from-emerald-500/80 to-lime-400/70",
        },
    ]
}

#[must_use]
pub fn quick_categories() -> Vec<QuickCategory> {
    vec![
        QuickCategory {
            label: "Home & Decor",
            link: "/categories/home-decor",
            image: "https://images.unsplash.com/photo-1493663284031-b7e3aefcae8e?auto=format&fit=crop&w=400&q=60",
        },
        QuickCategory {
            label: "Gourmet & Grocery",
            link: "/categories/gourmet",
            image: "https://images.unsplash.com/photo-1441123285228-1448e608f3d5?auto=format&fit=crop&w=400&q=60",
        },
        QuickCategory {
            label: "Electronics",
            link: "/categories/electronics",
            image: "https://images.unsplash.com/photo-1518770660439-4636190af475?auto=format&fit=crop&w=400&q=60",
        },
        QuickCategory {
            label: "Kids & Baby",
            link: "/categories/kids",
            image: "https://images.unsplash.com/photo-1503455637927-730bce8583c0?auto=format&fit=crop&w=400&q=60",
        },
        QuickCategory {
            label: "Books & Stationery",
            link: "/categories/books",
            image: "https://images.unsplash.com/photo-1457694587812-e8bf29a43845?auto=format&fit=crop&w=400&q=60",
        },
        QuickCategory {
            label: "Fashion & Essentials",
            link: "/categories/fashion",
            image: "https://images.unsplash.com/photo-1512436991641-6745cdb1723f?auto=format&fit=crop&w=400&q=60",
        },
    ]
}

#[must_use]
pub fn curated_collections() -> Vec<CuratedCollection> {
    vec![
        CuratedCollection {
            title: "Kid Studio",
            tagline: "Play tables • learning corners • bedtime comfort",
            link: "/collections/kids-studio",
            image: "https://images.unsplash.com/photo-1504610926078-a1611febcad3?auto=format&fit=crop&w=900&q=80",
        },
        CuratedCollection {
            title: "Designer corners",
            tagline: "Statement pieces from boutique creators on BBHCBazaar",
            link: "/collections/designer",
            image: "https://images.unsplash.com/photo-1505693314120-0d443867891c?auto=format&fit=crop&w=900&q=80",
        },
        CuratedCollection {
            title: "Fresh & fit pantry",
            tagline: "Cold-pressed oils, millet mixes and superfood jars",
            link: "/collections/pantry",
            image: "https://images.unsplash.com/photo-1457433575995-8407028a9970?auto=format&fit=crop&w=900&q=80",
        },
    ]
}

#[must_use]
pub fn recommendation_rows() -> Vec<RecommendationRow> {
    vec![
        RecommendationRow {
            id: "row-1",
            title: "Inspired by your browsing",
            link: "/collections/trending",
        },
        RecommendationRow {
            id: "row-2",
            title: "Top picks near you",
            link: "/collections/near-you",
        },
    ]
}

#[must_use]
pub fn spotlight_products() -> Vec<SpotlightProduct> {
    vec![
        SpotlightProduct {
            id: "spot-1",
            title: "Women's clothing",
            subtitle: "Under ₹499",
            cta: "See curated picks",
            link: "/collections/women-under-499",
            image: "https://images.unsplash.com/photo-1503341455253-b2e723bb3dbb?auto=format&fit=crop&w=900&q=80",
        },
        SpotlightProduct {
            id: "spot-2",
            title: "Sunglasses & frames",
            subtitle: "Under ₹499",
            cta: "Explore eyewear",
            link: "/collections/eyewear",
            image: "https://images.unsplash.com/photo-1518548419970-58e3b4079ab2?auto=format&fit=crop&w=900&q=80",
        },
        SpotlightProduct {
            id: "spot-3",
            title: "Footwear essentials",
            subtitle: "Starting ₹699",
            cta: "Step in style",
            link: "/collections/footwear",
            image: "https://images.unsplash.com/photo-1460353581641-37baddab0fa2?auto=format&fit=crop&w=900&q=80",
        },
    ]
}

#[must_use]
pub fn mobile_quick_links() -> Vec<NavLink> {
    vec![
        NavLink::new("Profile", "profile"),
        NavLink::new("Services", "services"),
        NavLink::new("Products", "products"),
        NavLink::new("Wishlist", "wishlist"),
        NavLink::new("Bag", "bag"),
    ]
}

#[must_use]
pub fn bottom_nav_items() -> Vec<NavLink> {
    vec![
        NavLink::new("Product", "product"),
        NavLink::new("Service", "service"),
        NavLink {
            is_active: true,
            ..NavLink::new("Home", "home")
        },
        NavLink::new("Bag", "bag"),
        NavLink::new("Me", "me"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSPLASH: &str = "https://images.unsplash.com";

    #[test]
    fn test_images_are_hosted() {
        assert!(hero_slides().iter().all(|s| s.image.starts_with(UNSPLASH)));
        assert!(quick_categories().iter().all(|c| c.image.starts_with(UNSPLASH)));
    }

    #[test]
    fn test_exactly_one_active_nav_item() {
        let active: Vec<_> = bottom_nav_items().into_iter().filter(|n| n.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].label, "Home");
    }
}
