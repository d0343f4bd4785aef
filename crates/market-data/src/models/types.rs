use std::borrow::Cow;
use std::sync::Arc;

/// Price source identifier - static constants ("AUCTION", "BAZAAR", "NPC")
pub type SourceId = Cow<'static, str>;

/// Source-facing item tag discovered at runtime (e.g. "UNIQUE_RUNE_JERRY")
pub type ItemTag = Arc<str>;
