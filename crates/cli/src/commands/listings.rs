//! Seller and master listing commands.
//!
//! The backend enforces roles; these commands only check that someone is
//! signed in.

use std::io::Write;

use bazaar_core::ProductId;
use bazaar_storefront::AppState;
use bazaar_storefront::api::ProductDraft;

use crate::error::CliError;
use crate::output;

pub async fn pending(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.auth().require_user()?;
    let products = state.products().pending().await?;
    if products.is_empty() {
        writeln!(out, "Nothing awaiting review")?;
    }
    for product in &products {
        writeln!(out, "{}", output::product_line(product, None, false))?;
    }
    Ok(())
}

pub async fn create(
    state: &AppState,
    out: &mut impl Write,
    draft: &ProductDraft,
) -> Result<(), CliError> {
    state.auth().require_user()?;
    let product = state.products().create(draft).await?;
    writeln!(
        out,
        "Created product {} ({:?})",
        product.id, product.approval_status
    )?;
    Ok(())
}

pub async fn delete(state: &AppState, out: &mut impl Write, id: &ProductId) -> Result<(), CliError> {
    state.auth().require_user()?;
    state.products().delete(id).await?;
    writeln!(out, "Deleted product {id}")?;
    Ok(())
}

pub async fn approve(state: &AppState, out: &mut impl Write, id: &ProductId) -> Result<(), CliError> {
    state.auth().require_user()?;
    state.products().approve(id).await?;
    writeln!(out, "Approved product {id}")?;
    Ok(())
}

pub async fn reject(
    state: &AppState,
    out: &mut impl Write,
    id: &ProductId,
    reason: Option<&str>,
) -> Result<(), CliError> {
    state.auth().require_user()?;
    state.products().reject(id, reason).await?;
    writeln!(out, "Rejected product {id}")?;
    Ok(())
}
