//! Plain-text rendering of storefront data.

use bazaar_storefront::api::{BagItem, CommissionRates, Order, Product, RatingStats};
use bazaar_storefront::store::selectors::{BagTotals, discount_badge};

/// One catalog row: id, name, customer price, discount and stock.
pub fn product_line(product: &Product, rates: Option<&CommissionRates>, wishlisted: bool) -> String {
    let mut line = format!(
        "{:>6}  {}{}  {}",
        product.id,
        if wishlisted { "♥ " } else { "" },
        product.name,
        product.customer_price(rates).display(),
    );
    if let Some(badge) = discount_badge(product) {
        line.push_str(&format!(" (was {}, {badge})", product.max_price.display()));
    }
    if !product.in_stock() {
        line.push_str("  [out of stock]");
    }
    line
}

/// Multi-line product page.
pub fn product_detail(
    product: &Product,
    rates: Option<&CommissionRates>,
    stats: Option<&RatingStats>,
) -> Vec<String> {
    let mut lines = vec![product_line(product, rates, false)];
    if let Some(stats) = stats {
        lines.push(format!("        {}", rating_summary(stats)));
    }
    if !product.categories.is_empty() {
        let names: Vec<&str> = product.categories.iter().map(|c| c.name.as_str()).collect();
        lines.push(format!("        Categories: {}", names.join(", ")));
    }
    if let Some(quantity) = product.quantity {
        lines.push(format!("        In stock: {quantity}"));
    }
    lines.extend(product.highlights.iter().map(|h| format!("        • {h}")));
    if !product.specification.is_empty() {
        lines.push(String::new());
        lines.push(product.specification.clone());
    }
    lines
}

/// e.g. `★★★★☆ 4.3 (12 ratings)`.
pub fn rating_summary(stats: &RatingStats) -> String {
    if stats.total_ratings == 0 {
        return "No ratings yet".to_string();
    }
    let filled = stats.average_rating.round().clamp(0.0, 5.0);
    let stars: String = (1..=5)
        .map(|n| if f64::from(n) <= filled { '★' } else { '☆' })
        .collect();
    format!(
        "{stars} {:.1} ({} rating{})",
        stats.average_rating,
        stats.total_ratings,
        if stats.total_ratings == 1 { "" } else { "s" }
    )
}

pub fn bag_line(item: &BagItem) -> String {
    let name = item
        .product
        .as_ref()
        .map_or_else(|| format!("Product {}", item.product_id), |p| p.name.clone());
    let variant: Vec<&str> = [item.selected_size.as_deref(), item.selected_color.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let variant = if variant.is_empty() {
        String::new()
    } else {
        format!(" [{}]", variant.join(", "))
    };
    format!(
        "{:>6}  {name}{variant}  {} x {} = {}",
        item.id,
        item.quantity,
        item.unit_price().display(),
        item.line_total().display(),
    )
}

pub fn totals_line(totals: &BagTotals) -> String {
    let savings = totals.savings();
    let mut line = format!(
        "{} item{}, {} unit{}: {}",
        totals.lines,
        if totals.lines == 1 { "" } else { "s" },
        totals.units,
        if totals.units == 1 { "" } else { "s" },
        totals.total.display(),
    );
    if savings.is_positive() {
        line.push_str(&format!(" (you save {})", savings.display()));
    }
    line
}

pub fn order_line(order: &Order) -> String {
    format!(
        "{}  {:?}  product {} x {}  {}",
        order.order_number.as_deref().unwrap_or(order.id.as_str()),
        order.status,
        order.product_id.as_ref().map_or("?", |id| id.as_str()),
        order.quantity,
        order.total_amount.map_or_else(String::new, |t| t.display()),
    )
}

#[cfg(test)]
mod tests {
    use bazaar_core::Price;

    use super::*;

    #[test]
    fn test_product_line_shows_discount() {
        let product = Product::new("7", "Cotton Kurta", Price::from_rupees(750), Price::from_rupees(1000));
        let line = product_line(&product, None, true);
        assert!(line.contains("♥ Cotton Kurta"));
        assert!(line.contains("₹750"));
        assert!(line.contains("25% off"));
    }

    #[test]
    fn test_product_line_without_discount() {
        let product = Product::new("8", "Lamp", Price::from_rupees(1000), Price::from_rupees(1000));
        let line = product_line(&product, None, false);
        assert!(!line.contains("off"));
    }

    #[test]
    fn test_rating_summary() {
        assert_eq!(rating_summary(&RatingStats::default()), "No ratings yet");
        let stats = RatingStats {
            total_ratings: 12,
            average_rating: 4.26,
            ..RatingStats::default()
        };
        assert_eq!(rating_summary(&stats), "★★★★☆ 4.3 (12 ratings)");
    }

    #[test]
    fn test_totals_line() {
        let totals = BagTotals {
            lines: 1,
            units: 2,
            total: Price::from_rupees(1500),
            list_total: Price::from_rupees(2000),
        };
        assert_eq!(totals_line(&totals), "1 item, 2 units: ₹1500 (you save ₹500)");
    }
}
