//! Item catalog reloads from the on-disk item repository.

use chrono::Utc;
use serde::Serialize;
use skyvestments_market_data::{load_catalog_dir, ItemCatalog};
use skyvestments_storage_json::CATALOG_TTL;
use tracing::{info, warn};

use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogRefresh {
    pub items: Vec<String>,
    /// True when the current catalog was kept instead of reloaded.
    pub cached: bool,
}

/// Whether the in-memory catalog was loaded within the last day.
pub fn catalog_is_fresh(state: &AppState) -> bool {
    let snapshot = state.catalog.snapshot();
    !snapshot.is_empty()
        && snapshot
            .loaded_at()
            .is_some_and(|at| Utc::now().signed_duration_since(at) < CATALOG_TTL)
}

/// Reloads only when the current catalog is older than a day.
pub async fn refresh_catalog_if_stale(state: &AppState) -> CatalogRefresh {
    if catalog_is_fresh(state) {
        return CatalogRefresh {
            items: state.catalog.display_names(),
            cached: true,
        };
    }
    reload_catalog(state).await
}

/// Rebuilds the catalog from `catalog_dir`, swaps it in and saves it.
///
/// A failed or empty load keeps the current catalog and reports `cached`.
pub async fn reload_catalog(state: &AppState) -> CatalogRefresh {
    let dir = state.catalog_dir.clone();
    let loaded = tokio::task::spawn_blocking(move || load_catalog_dir(&dir)).await;

    let snapshot = match loaded {
        Ok(Ok(snapshot)) if !snapshot.is_empty() => snapshot,
        Ok(Ok(_)) => {
            warn!(
                "No items found in {}; keeping current catalog",
                state.catalog_dir.display()
            );
            return kept(state);
        }
        Ok(Err(e)) => {
            warn!(
                "Failed to read item repository {}: {}",
                state.catalog_dir.display(),
                e
            );
            return kept(state);
        }
        Err(e) => {
            warn!("Catalog reload task failed: {}", e);
            return kept(state);
        }
    };

    if let Err(e) = state.catalog_store.save(&snapshot) {
        warn!("Failed to save item catalog: {}", e);
    }
    let items = snapshot.display_names();
    state.catalog.replace(snapshot);
    info!("Item catalog reloaded with {} items", items.len());

    CatalogRefresh {
        items,
        cached: false,
    }
}

fn kept(state: &AppState) -> CatalogRefresh {
    CatalogRefresh {
        items: state.catalog.display_names(),
        cached: true,
    }
}
