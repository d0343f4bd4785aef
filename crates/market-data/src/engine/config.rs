use chrono::Duration;

use crate::cache::PRICE_TTL;
use crate::provider::DEFAULT_PAGE_CAP;

/// Tunables for [`PriceResolutionEngine`](super::PriceResolutionEngine).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Cached records younger than this are served without a lookup.
    pub price_ttl: Duration,
    /// Maximum auction result pages scanned per tag.
    pub auction_page_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_ttl: PRICE_TTL,
            auction_page_cap: DEFAULT_PAGE_CAP,
        }
    }
}
