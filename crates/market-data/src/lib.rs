//! Skyvestments Market Data Crate
//!
//! Price resolution and caching for tracked SkyBlock items.
//!
//! # Overview
//!
//! Given an item's display name, the engine:
//! - normalizes it into the tag(s) the upstream sources understand
//! - asks the auction, bazaar and NPC sources in that order
//! - caches the result for 30 minutes
//! - serves the last cached price when every source fails
//!
//! # Architecture
//!
//! ```text
//!                       display name
//!                            |
//!                            v
//!                  +------------------+
//!                  |  PriceCacheStore |  fresh record? return it
//!                  +------------------+
//!                            | miss / stale
//!                            v
//!                  +------------------+
//!                  |IdentifierResolver|  catalog lookup + rune rewrite
//!                  +------------------+
//!                            |
//!                            v
//!                  +------------------+
//!                  | PriceSourceChain |  Auction -> Bazaar -> NPC
//!                  +------------------+
//!                            |
//!                            v
//!                  +------------------+
//!                  |   PriceRecord    |  rounded to a tenth, cached
//!                  +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`PriceResolutionEngine`] - The single entry point
//! - [`ItemKey`] - Canonical, catalog-independent cache key
//! - [`ItemIdentifier`] - Source-facing identity (primary and alternate tags)
//! - [`PriceRecord`] - Normalized price, identical in shape for every source
//! - [`PriceSource`] - Which source produced a record

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

// Re-export model types
pub use models::{
    price_from_f64, round_to_tenth, ItemIdentifier, ItemKey, ItemTag, PriceCandidate,
    PriceRecord, PriceSource, SourceId, RUNE_MARKER,
};

// Re-export engine types
pub use cache::{is_stale, InMemoryPriceCache, PriceCacheStore, SharedPriceCache, PRICE_TTL};
pub use engine::{EngineConfig, PriceResolutionEngine, Resolution, ResolutionOutcome};

// Re-export catalog types
pub use catalog::{
    load_catalog_dir, strip_formatting_codes, CatalogEntry, CatalogSnapshot, ItemCatalog,
    SharedCatalog,
};

// Re-export resolver types
pub use resolver::{IdentifierResolver, ItemResolver, RuneTagRule, TagForms, TagRule};

// Re-export provider types
pub use provider::{
    AuctionFeed, AuctionListing, AuctionProvider, BazaarFeed, BazaarProvider, BazaarQuote,
    CoflnetClient, CoflnetConfig, NpcProvider, PriceProvider, ProviderCapabilities, RateLimit,
    RateLimiter, Throttled,
};

// Re-export registry types
pub use registry::{
    AttemptOutcome, ChainDiagnostics, ChainLookup, CircuitBreaker, CircuitState,
    PriceSourceChain, SkipReason, SourceHealth, SourceHit,
};

pub use errors::{MarketDataError, RetryClass};
