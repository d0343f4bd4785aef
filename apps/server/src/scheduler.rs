//! Background refresh loops.
//!
//! Prices of tracked items are re-resolved every `price_refresh_interval`
//! and the item catalog is reloaded every `catalog_refresh_interval`.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::catalog_sync::refresh_catalog_if_stale;
use crate::main_lib::AppState;

/// Initial delay before the first price refresh, so start-up requests win.
const INITIAL_DELAY_SECS: u64 = 30;

pub fn start_price_refresh_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Price refresh scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_price_refresh(&state).await;
        }
    });
}

pub fn start_catalog_refresh_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Catalog refresh scheduler started ({}s interval)", every.as_secs());

        let mut ticker = interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick is immediate; start-up already loaded the catalog.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let refresh = refresh_catalog_if_stale(&state).await;
            debug!(
                "Scheduled catalog refresh: {} items (cached: {})",
                refresh.items.len(),
                refresh.cached
            );
        }
    });
}

/// Runs one pass over the tracked items.
pub async fn run_price_refresh(state: &AppState) {
    let names = match state.entries.tracked_items() {
        Ok(names) => names,
        Err(e) => {
            warn!("Scheduled price refresh skipped: cannot read entries: {}", e);
            return;
        }
    };

    if names.is_empty() {
        debug!("Scheduled price refresh skipped: no tracked items");
        return;
    }

    info!("Refreshing prices for {} tracked items", names.len());
    let results = state.engine.refresh_all(names).await;
    let unavailable = results.iter().filter(|(_, r)| r.is_none()).count();
    if unavailable > 0 {
        warn!(
            "Price refresh finished: {} of {} items have no price",
            unavailable,
            results.len()
        );
    } else {
        info!("Price refresh finished for {} items", results.len());
    }
}
