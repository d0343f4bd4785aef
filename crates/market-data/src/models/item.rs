use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::types::ItemTag;

/// Display-name marker carried by every rune item ("◆ Jerry Rune I").
pub const RUNE_MARKER: char = '◆';

/// Canonical cache key derived from an item display name.
///
/// Lower-cased, whitespace runs collapsed to `_`, and anything outside
/// `[a-z0-9_]` dropped, so "Hyperion", "hyperion" and " HYPERION " share a key.
/// Deserialized keys are canonicalized the same way.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_display_name(&raw))
    }
}

impl ItemKey {
    /// Derive the key for a display name.
    pub fn from_display_name(display_name: &str) -> Self {
        let lowered = display_name.to_lowercase();
        let mut key = String::with_capacity(lowered.len());
        let mut in_whitespace = false;

        for ch in lowered.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    key.push('_');
                }
                in_whitespace = true;
                continue;
            }
            in_whitespace = false;
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
                key.push(ch);
            }
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(display_name: &str) -> Self {
        Self::from_display_name(display_name)
    }
}

/// An item as the price sources see it.
///
/// Produced by the identifier resolver from a catalog lookup. `internal_tag`
/// is the catalog's own identifier; `primary_tag` and `alternate_tag` are the
/// forms sent upstream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemIdentifier {
    /// Free-text name as the user and catalog know it.
    pub display_name: String,
    /// Catalog identifier, untransformed (e.g. "JERRY_RUNE;3").
    pub internal_tag: ItemTag,
    /// Tag tried first against upstream sources.
    pub primary_tag: ItemTag,
    /// Legacy tag retried by the auction source when the primary finds nothing.
    pub alternate_tag: Option<ItemTag>,
}

impl ItemIdentifier {
    /// Identifier for an item whose tag needs no upstream transformation.
    pub fn plain(display_name: impl Into<String>, internal_tag: impl Into<ItemTag>) -> Self {
        let internal_tag = internal_tag.into();
        Self {
            display_name: display_name.into(),
            primary_tag: internal_tag.clone(),
            internal_tag,
            alternate_tag: None,
        }
    }

    /// Cache key for this item.
    pub fn key(&self) -> ItemKey {
        ItemKey::from_display_name(&self.display_name)
    }

    /// Whether the display name carries the rune marker.
    ///
    /// Only runes fall back to the NPC vendor price.
    pub fn is_rune(&self) -> bool {
        self.display_name.contains(RUNE_MARKER)
    }

    /// Tags to search in order: primary, then alternate if any.
    pub fn search_tags(&self) -> impl Iterator<Item = &ItemTag> {
        std::iter::once(&self.primary_tag).chain(self.alternate_tag.iter())
    }
}
