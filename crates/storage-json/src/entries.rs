//! Portfolio entries persisted as `entries.json`.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::JsonDocument;
use crate::errors::Result;

/// One purchase of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub item_name: String,
    pub buy_price: Decimal,
    pub quantity: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// On-disk shape: `{ "entries": [ ... ] }`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntriesFile {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl EntriesFile {
    /// Distinct item names in first-seen order.
    pub fn tracked_items(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.item_name.as_str()))
            .map(|e| e.item_name.clone())
            .collect()
    }
}

pub struct EntryStore {
    document: JsonDocument<EntriesFile>,
}

impl EntryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn load(&self) -> Result<EntriesFile> {
        self.document.load()
    }

    pub fn replace(&self, entries: &EntriesFile) -> Result<()> {
        self.document.save(entries)
    }

    pub fn tracked_items(&self) -> Result<Vec<String>> {
        Ok(self.load()?.tracked_items())
    }
}
