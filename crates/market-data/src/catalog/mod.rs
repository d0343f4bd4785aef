//! Item catalog: display name -> internal tag, plus static vendor prices.
//!
//! The catalog is refreshed out-of-band (roughly daily) and is read-only to
//! the price engine. [`SharedCatalog`] lets the refresher swap in a new
//! [`CatalogSnapshot`] while resolutions keep reading the old one.

mod loader;

pub use loader::{load_catalog_dir, strip_formatting_codes};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// One catalog row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Display name with formatting codes removed.
    pub name: String,
    /// Internal identifier (e.g. "HYPERION", "JERRY_RUNE;3").
    pub internal_id: String,
    /// Fixed vendor payout, when the item has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_sell_price: Option<f64>,
}

/// Read-only lookup the engine resolves items against.
pub trait ItemCatalog: Send + Sync {
    /// Internal tag for an exact (case-sensitive) display name.
    fn lookup_tag(&self, display_name: &str) -> Option<String>;

    /// Vendor sell price recorded for an internal tag.
    fn npc_sell_price(&self, internal_tag: &str) -> Option<f64>;

    /// Sorted, de-duplicated display names.
    fn display_names(&self) -> Vec<String>;
}

/// Immutable catalog contents.
#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_tag: HashMap<String, usize>,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Build a snapshot. On duplicate display names the first entry wins.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_tag = HashMap::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_insert(idx);
            by_tag.entry(entry.internal_id.clone()).or_insert(idx);
        }

        Self {
            entries,
            by_name,
            by_tag,
            loaded_at: None,
        }
    }

    pub fn with_loaded_at(mut self, loaded_at: DateTime<Utc>) -> Self {
        self.loaded_at = Some(loaded_at);
        self
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ItemCatalog for CatalogSnapshot {
    fn lookup_tag(&self, display_name: &str) -> Option<String> {
        self.by_name
            .get(display_name)
            .map(|&idx| self.entries[idx].internal_id.clone())
    }

    fn npc_sell_price(&self, internal_tag: &str) -> Option<f64> {
        self.by_tag
            .get(internal_tag)
            .and_then(|&idx| self.entries[idx].npc_sell_price)
    }

    fn display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Catalog handle whose snapshot can be replaced at runtime.
#[derive(Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl SharedCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in use right now.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("Catalog lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    /// Swap in a freshly loaded snapshot.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| {
            warn!("Catalog lock was poisoned, recovering");
            poisoned.into_inner()
        });
        *guard = Arc::new(snapshot);
    }
}

impl ItemCatalog for SharedCatalog {
    fn lookup_tag(&self, display_name: &str) -> Option<String> {
        self.snapshot().lookup_tag(display_name)
    }

    fn npc_sell_price(&self, internal_tag: &str) -> Option<f64> {
        self.snapshot().npc_sell_price(internal_tag)
    }

    fn display_names(&self) -> Vec<String> {
        self.snapshot().display_names()
    }
}
