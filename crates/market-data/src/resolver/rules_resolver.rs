//! Deterministic tag rewrite rules.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::traits::{TagForms, TagRule};

lazy_static! {
    /// `<RUNE_TYPE>_RUNE;<level>`, e.g. `JERRY_RUNE;3` or `MUSIC_RUNE;1`.
    static ref RUNE_TAG: Regex = Regex::new(r"^([A-Z_]+)_RUNE;(\d+)$").unwrap();
}

/// Prefix of the auction-house tag for runes.
pub const UNIQUE_RUNE_PREFIX: &str = "UNIQUE_RUNE_";

/// Prefix of the legacy rune tag.
pub const LEGACY_RUNE_PREFIX: &str = "RUNE_";

/// Rewrites catalog rune tags into the upstream forms.
///
/// `JERRY_RUNE;3` becomes primary `UNIQUE_RUNE_JERRY` with alternate
/// `RUNE_JERRY`. The level suffix is dropped in both.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuneTagRule;

impl RuneTagRule {
    pub fn new() -> Self {
        Self
    }
}

impl TagRule for RuneTagRule {
    fn apply(&self, internal_tag: &str) -> Option<TagForms> {
        let captures = RUNE_TAG.captures(internal_tag)?;
        let rune_type = captures.get(1)?.as_str();

        Some(TagForms {
            primary: Arc::from(format!("{}{}", UNIQUE_RUNE_PREFIX, rune_type)),
            alternate: Some(Arc::from(format!("{}{}", LEGACY_RUNE_PREFIX, rune_type))),
        })
    }
}
