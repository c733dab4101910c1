//! Wishlist commands.

use std::io::Write;

use bazaar_core::ProductId;
use bazaar_storefront::AppState;
use bazaar_storefront::services::WishlistChange;
use bazaar_storefront::store::selectors;

use crate::error::CliError;
use crate::output;

pub async fn show(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let ids = state.wishlist().load().await?;
    if ids.is_empty() {
        writeln!(out, "Your wishlist is empty")?;
        return Ok(());
    }
    state.catalog().home_products().await?;

    let (lines, missing) = state.store().select(|s| {
        let lines: Vec<String> = selectors::wishlist_products(s)
            .into_iter()
            .map(|p| output::product_line(p, None, true))
            .collect();
        let missing = s.data.home.wishlist.len().saturating_sub(lines.len());
        (lines, missing)
    });
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    if missing > 0 {
        writeln!(out, "({missing} wishlisted product(s) no longer listed)")?;
    }
    Ok(())
}

/// Add the product if it is not wishlisted, remove it otherwise.
pub async fn toggle(state: &AppState, out: &mut impl Write, id: &ProductId) -> Result<(), CliError> {
    state.wishlist().load().await?;
    match state.wishlist().toggle(id).await? {
        WishlistChange::Added => writeln!(out, "Added product {id} to your wishlist")?,
        WishlistChange::Removed => writeln!(out, "Removed product {id} from your wishlist")?,
    }
    Ok(())
}
