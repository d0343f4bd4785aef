//! Cached item catalog persisted as `items.json`.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use skyvestments_market_data::{CatalogEntry, CatalogSnapshot, ItemCatalog};

use crate::document::JsonDocument;
use crate::errors::Result;

/// Catalog entries older than this are reloaded from the item repository.
pub const CATALOG_TTL: Duration = Duration::hours(24);

/// On-disk shape: sorted display names, the full table, and when it was built.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub item_map: Vec<CatalogEntry>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CatalogFile {
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        Self {
            items: snapshot.display_names(),
            item_map: snapshot.entries().to_vec(),
            last_updated: snapshot.loaded_at(),
        }
    }

    pub fn into_snapshot(self) -> CatalogSnapshot {
        let snapshot = CatalogSnapshot::new(self.item_map);
        match self.last_updated {
            Some(at) => snapshot.with_loaded_at(at),
            None => snapshot,
        }
    }

    /// Never-updated documents are stale.
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.last_updated
            .map_or(true, |at| now.signed_duration_since(at) >= max_age)
    }
}

pub struct CatalogStore {
    document: JsonDocument<CatalogFile>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn load(&self) -> Result<CatalogFile> {
        self.document.load()
    }

    pub fn load_or_default(&self) -> CatalogFile {
        self.document.load_or_default()
    }

    pub fn save(&self, snapshot: &CatalogSnapshot) -> Result<()> {
        self.document.save(&CatalogFile::from_snapshot(snapshot))
    }
}
