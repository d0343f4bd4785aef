//! Resolution traits for the market data crate.
//!
//! Defines how a catalog display name becomes the tags sent upstream.

use crate::errors::MarketDataError;
use crate::models::{ItemIdentifier, ItemTag};

/// Upstream tag forms produced by a rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagForms {
    /// Tag tried first.
    pub primary: ItemTag,
    /// Legacy form retried when the primary yields nothing.
    pub alternate: Option<ItemTag>,
}

/// Individual tag rewrite rule.
///
/// Rules are tried in order until one returns a result. Returning `None`
/// means the rule does not apply to this tag, and the next rule is tried.
pub trait TagRule: Send + Sync {
    /// Attempt to rewrite a catalog tag into its upstream forms.
    fn apply(&self, internal_tag: &str) -> Option<TagForms>;
}

/// Main item resolver interface.
pub trait ItemResolver: Send + Sync {
    /// Resolve a display name into source-facing identifiers.
    ///
    /// # Returns
    /// * `Ok(identifier)` - The item is catalogued
    /// * `Err(MarketDataError::UnknownItem)` - The display name is not in the catalog
    fn resolve(&self, display_name: &str) -> Result<ItemIdentifier, MarketDataError>;
}
