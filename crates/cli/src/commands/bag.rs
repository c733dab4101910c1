//! Bag commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar bag add 42 --quantity 2 --size M
//! bazaar bag inc 7
//! bazaar bag set 7 0      # removes the line
//! bazaar bag show
//! ```

use std::io::Write;

use bazaar_core::{BagItemId, ProductId};
use bazaar_storefront::AppState;
use bazaar_storefront::api::NewBagItem;
use bazaar_storefront::services::BagChange;
use bazaar_storefront::store::selectors;

use crate::error::CliError;
use crate::output;

/// Edit applied to one bag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Increment,
    Decrement,
    Set(u32),
    Remove,
}

pub async fn show(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.bag().load().await?;
    write_bag(state, out)
}

pub async fn add(
    state: &AppState,
    out: &mut impl Write,
    product_id: ProductId,
    quantity: u32,
    selected_size: Option<String>,
    selected_color: Option<String>,
) -> Result<(), CliError> {
    state.bag().load().await?;
    // Warm the catalog so the new line gets a product snapshot.
    if let Err(e) = state.catalog().product(&product_id).await {
        tracing::debug!(error = %e, "Product lookup failed");
    }
    let item = state
        .bag()
        .add(&NewBagItem {
            product_id,
            quantity,
            selected_size,
            selected_color,
        })
        .await?;
    writeln!(out, "Added: {}", output::bag_line(&item))?;
    write_bag(state, out)
}

pub async fn change(
    state: &AppState,
    out: &mut impl Write,
    id: &BagItemId,
    change: LineChange,
) -> Result<(), CliError> {
    state.bag().load().await?;
    let bag = state.bag();
    let outcome = match change {
        LineChange::Increment => bag.increment(id).await?,
        LineChange::Decrement => bag.decrement(id).await?,
        LineChange::Set(quantity) => bag.set_quantity(id, quantity).await?,
        LineChange::Remove => bag.remove(id).await?,
    };
    match outcome {
        BagChange::Updated(item) => writeln!(out, "Updated: {}", output::bag_line(&item))?,
        BagChange::Removed(id) => writeln!(out, "Removed line {id}")?,
    }
    write_bag(state, out)
}

pub async fn clear(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.bag().clear().await?;
    writeln!(out, "Your bag is empty")?;
    Ok(())
}

fn write_bag(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let (lines, totals) = state.store().select(|s| {
        let lines: Vec<String> = s.bag.items.iter().map(output::bag_line).collect();
        (lines, selectors::bag_totals(s))
    });
    if lines.is_empty() {
        writeln!(out, "Your bag is empty")?;
        return Ok(());
    }
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", output::totals_line(&totals))?;
    Ok(())
}
