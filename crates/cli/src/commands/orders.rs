//! Rating, checkout and order history commands.

use std::io::Write;

use bazaar_core::ProductId;
use bazaar_storefront::AppState;

use crate::error::CliError;
use crate::output;

pub async fn rate(
    state: &AppState,
    out: &mut impl Write,
    id: &ProductId,
    stars: u8,
    review: Option<&str>,
) -> Result<(), CliError> {
    state.auth().require_user()?;
    let saved = state.ratings().submit(id, stars, review).await?;
    writeln!(out, "Rated product {} {} / 5", saved.product_id, saved.rating)?;
    let stats = state.ratings().stats(id).await?;
    writeln!(out, "{}", output::rating_summary(&stats))?;
    Ok(())
}

/// Turn every bag line into a QR pickup order.
pub async fn checkout(
    state: &AppState,
    out: &mut impl Write,
    pickup_location: Option<String>,
) -> Result<(), CliError> {
    state.auth().require_user()?;
    state.bag().load().await?;
    let orders = state.checkout().checkout(pickup_location).await?;
    writeln!(out, "Placed {} order(s):", orders.len())?;
    for order in &orders {
        writeln!(out, "{}", output::order_line(order))?;
        if let Some(qr) = &order.qr_code_data {
            writeln!(out, "    QR: {qr}")?;
        }
    }
    Ok(())
}

pub async fn list(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.auth().require_user()?;
    let orders = state.checkout().orders().await?;
    if orders.is_empty() {
        writeln!(out, "No orders yet")?;
    }
    for order in &orders {
        writeln!(out, "{}", output::order_line(order))?;
    }
    Ok(())
}
