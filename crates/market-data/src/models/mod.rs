//! Price resolution models
//!
//! - `types` - Type aliases for source and tag identifiers
//! - `item` - Canonical cache key (ItemKey) and source-facing identity (ItemIdentifier)
//! - `record` - Normalized price record, source tag, and rounding rules

mod item;
mod record;
mod types;

pub use item::{ItemIdentifier, ItemKey, RUNE_MARKER};
pub use record::{price_from_f64, round_to_tenth, PriceCandidate, PriceRecord, PriceSource};
pub use types::{ItemTag, SourceId};
