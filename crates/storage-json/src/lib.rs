//! JSON file storage for Skyvestments.
//!
//! Three documents live in the data directory:
//!
//! ```text
//! data/
//! ├── prices.json   last resolved price per item (write-through cache)
//! ├── entries.json  tracked purchases
//! └── items.json    cached item catalog
//! ```
//!
//! Each is read and written whole; see [`JsonDocument`].

pub mod catalog;
pub mod document;
pub mod entries;
pub mod errors;
pub mod prices;

use std::path::{Path, PathBuf};

pub use catalog::{CatalogFile, CatalogStore, CATALOG_TTL};
pub use document::JsonDocument;
pub use entries::{EntriesFile, Entry, EntryStore};
pub use errors::{Result, StorageError};
pub use prices::{JsonPriceStore, PersistentPriceCache, PricesFile};

pub const PRICES_FILE: &str = "prices.json";
pub const ENTRIES_FILE: &str = "entries.json";
pub const ITEMS_FILE: &str = "items.json";

/// Paths of the three documents under one data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub prices: PathBuf,
    pub entries: PathBuf,
    pub items: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            prices: data_dir.join(PRICES_FILE),
            entries: data_dir.join(ENTRIES_FILE),
            items: data_dir.join(ITEMS_FILE),
        }
    }
}
