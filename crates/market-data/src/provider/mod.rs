//! Price source abstractions and implementations.
//!
//! This module contains:
//! - The `PriceProvider` trait that all price sources implement
//! - Source capabilities, and per-request rate limiting of upstream feeds
//! - The three sources: auction, bazaar, NPC
//! - The Coflnet HTTP client backing the auction and bazaar feeds
//!
//! # Architecture
//!
//! Sources are split from their transport. [`AuctionProvider`] and
//! [`BazaarProvider`] hold the pricing rules and talk to an upstream through
//! the [`AuctionFeed`] / [`BazaarFeed`] traits, so the rules can be tested
//! against in-memory feeds. [`NpcProvider`] reads the catalog directly.
//!
//! Sources receive an already-resolved [`ItemIdentifier`](crate::models::ItemIdentifier);
//! tag rewriting happens in the resolver module.

mod capabilities;
mod rate_limiter;
mod throttled;
mod traits;

pub mod auction;
pub mod bazaar;
pub mod coflnet;
pub mod npc;

// Re-exports
pub use auction::{AuctionFeed, AuctionListing, AuctionProvider, DEFAULT_PAGE_CAP};
pub use bazaar::{BazaarFeed, BazaarProvider, BazaarQuote};
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use coflnet::{CoflnetClient, CoflnetConfig};
pub use npc::NpcProvider;
pub use rate_limiter::RateLimiter;
pub use throttled::Throttled;
pub use traits::PriceProvider;
