//! Loader for a directory of per-item JSON records.
//!
//! Each `<INTERNAL_ID>.json` file looks like
//! `{ "displayname": "§5◆ Jerry Rune I", "internalname": "JERRY_RUNE;1", "npc_sell_price": 250 }`.

use std::fs;
use std::io;
use std::path::Path;

use chrono::Utc;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use super::{CatalogEntry, CatalogSnapshot};

lazy_static! {
    static ref FORMATTING_CODE: Regex = Regex::new(r"(?i)§[0-9a-fk-or]").unwrap();
}

#[derive(Debug, Deserialize)]
struct RawItemRecord {
    displayname: Option<String>,
    internalname: Option<String>,
    npc_sell_price: Option<f64>,
}

/// Remove `§x` colour/format codes and surrounding whitespace.
pub fn strip_formatting_codes(name: &str) -> String {
    FORMATTING_CODE.replace_all(name, "").trim().to_string()
}

/// Read every `*.json` item record under `dir` into a snapshot.
///
/// Files that cannot be read or parsed, or that have no display name, are
/// skipped. Fails only if the directory itself cannot be listed.
pub fn load_catalog_dir(dir: &Path) -> io::Result<CatalogSnapshot> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    // Directory order is platform dependent
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping unreadable item file {:?}: {}", path, e);
                continue;
            }
        };
        let record: RawItemRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping invalid item file {:?}: {}", path, e);
                continue;
            }
        };

        let Some(display_name) = record.displayname else {
            continue;
        };
        let internal_id = match record.internalname {
            Some(id) => id,
            None => match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            },
        };

        entries.push(CatalogEntry {
            name: strip_formatting_codes(&display_name),
            internal_id,
            npc_sell_price: record.npc_sell_price,
        });
    }

    info!("Loaded {} catalog items from {:?}", entries.len(), dir);
    Ok(CatalogSnapshot::new(entries).with_loaded_at(Utc::now()))
}
