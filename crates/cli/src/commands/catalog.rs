//! Catalog browsing commands.

use std::io::Write;

use bazaar_core::{Price, ProductId};
use bazaar_storefront::AppState;
use bazaar_storefront::api::{CommissionRates, Product};
use bazaar_storefront::store::selectors;

use crate::error::CliError;
use crate::output;

/// Filters applied to the local catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl CatalogFilter {
    fn is_price_bounded(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

/// List approved products matching every filter.
pub async fn list(
    state: &AppState,
    out: &mut impl Write,
    filter: &CatalogFilter,
    refresh: bool,
) -> Result<(), CliError> {
    if refresh {
        state.catalog().refresh().await?;
    } else {
        state.catalog().home_products().await?;
    }
    if state.auth().is_authenticated()
        && let Err(e) = state.wishlist().load().await
    {
        tracing::debug!(error = %e, "Wishlist unavailable");
    }

    // Without rates, prices fall back to what the backend reported.
    let rates = if filter.is_price_bounded() {
        state.catalog().commission_rates().await.ok()
    } else {
        None
    };

    let lines = state.store().select(|s| {
        let mut matches: Vec<&Product> =
            selectors::products_in_price_range(s, filter.min_price, filter.max_price, rates.as_ref());
        if let Some(query) = &filter.search {
            matches.retain(|p| selectors::product_matches(p, query));
        }
        if let Some(category) = &filter.category {
            matches.retain(|p| p.in_category(category));
        }
        matches
            .into_iter()
            .map(|p| output::product_line(p, rates.as_ref(), selectors::is_wishlisted(s, &p.id)))
            .collect::<Vec<_>>()
    });

    if lines.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "\n{} product{}", lines.len(), if lines.len() == 1 { "" } else { "s" })?;
    Ok(())
}

/// Show one product with its rating aggregate.
pub async fn show(state: &AppState, out: &mut impl Write, id: &ProductId) -> Result<(), CliError> {
    let product = state.catalog().product(id).await?;
    let rates = state.catalog().commission_rates().await.ok();
    let stats = match state.ratings().stats(id).await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::debug!(error = %e, "Rating stats unavailable");
            product.rating.clone()
        }
    };

    for line in output::product_detail(&product, rates.as_ref(), stats.as_ref()) {
        writeln!(out, "{line}")?;
    }

    if state.auth().is_authenticated()
        && let Ok(Some(mine)) = state.ratings().mine(id).await
    {
        writeln!(out, "\nYour rating: {} / 5", mine.rating)?;
        if let Some(review) = &mine.review_text {
            writeln!(out, "  \"{review}\"")?;
        }
    }
    Ok(())
}

/// List categories with their commission percentage.
pub async fn categories(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let categories = state.catalog().categories().await?;
    let rates: CommissionRates = state.catalog().commission_rates().await.unwrap_or_default();
    for category in &categories {
        let rate = category.commission_rate.or_else(|| {
            rates.rate(&bazaar_storefront::api::CategoryRef {
                id: Some(category.id.clone()),
                name: category.name.clone(),
            })
        });
        match rate {
            Some(rate) => writeln!(out, "{:>6}  {}  ({rate}% commission)", category.id, category.name)?,
            None => writeln!(out, "{:>6}  {}", category.id, category.name)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_bounded() {
        assert!(!CatalogFilter::default().is_price_bounded());
        let filter = CatalogFilter {
            max_price: Some(Price::from_rupees(500)),
            ..CatalogFilter::default()
        };
        assert!(filter.is_price_bounded());
    }
}
