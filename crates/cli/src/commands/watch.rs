//! Stream realtime catalog events to the terminal.

use std::io::Write;

use bazaar_storefront::realtime::{
    ConnectionState, PRODUCT_CREATED, PRODUCT_UPDATED, RATING_UPDATED, RealtimeEvent,
};
use bazaar_storefront::{AppState, StorefrontError};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::CliError;
use crate::output;

/// Print every catalog push until Ctrl+C. The local catalog is kept merged
/// while watching.
pub async fn run(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.catalog().home_products().await?;
    let mut subscriptions = state.catalog().attach(state.realtime());

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    for event in [PRODUCT_CREATED, PRODUCT_UPDATED, RATING_UPDATED] {
        let tx = tx.clone();
        subscriptions.push(state.realtime().subscribe(event, move |event| {
            // The receiver only goes away on shutdown.
            let _ = tx.send(describe(event));
        }));
    }
    drop(tx);

    state.realtime().connect().map_err(StorefrontError::from)?;
    let mut connection = state.realtime().watch_state();
    let restart_every = state.config().realtime.restart_delay();
    let mut restart = tokio::time::interval_at(Instant::now() + restart_every, restart_every);
    restart.set_missed_tick_behavior(MissedTickBehavior::Delay);
    writeln!(out, "Watching for catalog updates (Ctrl+C to stop)")?;
    out.flush()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(line) = rx.recv() => {
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            Ok(()) = connection.changed() => {
                let current = *connection.borrow_and_update();
                tracing::info!(state = ?current, "Realtime connection");
                if current == ConnectionState::Disconnected {
                    writeln!(out, "Disconnected; waiting for the connection to come back")?;
                }
            }
            _ = restart.tick() => {
                if state.realtime().revive() {
                    writeln!(out, "Reconnecting")?;
                }
            }
        }
    }

    for id in subscriptions {
        state.realtime().unsubscribe(id);
    }
    state.realtime().disconnect();
    Ok(())
}

fn describe(event: &RealtimeEvent) -> String {
    match event {
        RealtimeEvent::ProductCreated(product) => {
            format!("+ {}", output::product_line(product, None, false))
        }
        RealtimeEvent::ProductUpdated(patch) => {
            let mut changed = Vec::new();
            if let Some(name) = &patch.name {
                changed.push(format!("name \"{name}\""));
            }
            if let Some(price) = patch.total_price.or(patch.selling_price) {
                changed.push(format!("price {}", price.display()));
            }
            if let Some(quantity) = patch.quantity {
                changed.push(format!("stock {quantity}"));
            }
            if let Some(status) = patch.approval_status {
                changed.push(format!("status {status:?}"));
            }
            if changed.is_empty() {
                format!("~ product {} updated", patch.id)
            } else {
                format!("~ product {}: {}", patch.id, changed.join(", "))
            }
        }
        RealtimeEvent::RatingUpdated(update) => format!(
            "* product {}: {}",
            update.product_id,
            output::rating_summary(&update.stats)
        ),
        RealtimeEvent::Other { event, .. } => format!("? {event}"),
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::Price;
    use bazaar_storefront::api::ProductPatch;

    use super::*;

    #[test]
    fn test_describe_patch() {
        let patch = ProductPatch {
            id: "5".into(),
            selling_price: Some(Price::from_rupees(450)),
            quantity: Some(0),
            ..ProductPatch::default()
        };
        assert_eq!(
            describe(&RealtimeEvent::ProductUpdated(patch)),
            "~ product 5: price ₹450, stock 0"
        );
    }

    #[test]
    fn test_describe_empty_patch() {
        let patch = ProductPatch {
            id: "5".into(),
            ..ProductPatch::default()
        };
        assert_eq!(describe(&RealtimeEvent::ProductUpdated(patch)), "~ product 5 updated");
    }
}
