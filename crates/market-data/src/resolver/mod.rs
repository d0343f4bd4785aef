//! Item identifier resolution for price sources.
//!
//! Converts a catalog display name into the tag(s) each upstream expects.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                 IdentifierResolver                    │
//! │                                                       │
//! │  1. Catalog lookup (exact display name)               │
//! │     miss -> UnknownItem                               │
//! │                        │                              │
//! │                        ▼                              │
//! │  2. Tag rules (first match wins)                      │
//! │     - RuneTagRule: X_RUNE;n -> UNIQUE_RUNE_X / RUNE_X │
//! │                        │ no rule                      │
//! │                        ▼                              │
//! │  3. Catalog tag used verbatim                         │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The cache key is not derived here; it comes from the display name alone
//! (see [`ItemKey`](crate::models::ItemKey)).

mod chain;
mod rules_resolver;
mod traits;

pub use chain::IdentifierResolver;
pub use rules_resolver::{RuneTagRule, LEGACY_RUNE_PREFIX, UNIQUE_RUNE_PREFIX};
pub use traits::{ItemResolver, TagForms, TagRule};
