//! Auction house price source.
//!
//! Prices an item at the lowest starting bid among active buy-it-now
//! listings. The upstream query is a paged search rather than a direct
//! lookup, so the scan is capped at a fixed number of pages.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{price_from_f64, ItemIdentifier, PriceCandidate, PriceSource};
use crate::provider::{PriceProvider, ProviderCapabilities};

/// Default maximum number of result pages fetched per tag.
pub const DEFAULT_PAGE_CAP: u32 = 10;

/// One active listing as returned by the auction search.
#[derive(Clone, Debug, PartialEq)]
pub struct AuctionListing {
    pub item_name: String,
    pub is_bin: bool,
    pub starting_bid: f64,
}

impl AuctionListing {
    /// Buy-it-now listing with a usable price.
    fn qualifies(&self) -> bool {
        self.is_bin && self.starting_bid.is_finite() && self.starting_bid > 0.0
    }
}

/// Upstream auction search: `(tag, page) -> listings`.
///
/// An empty page means there are no further results for the tag.
#[async_trait]
pub trait AuctionFeed: Send + Sync {
    async fn fetch_page(&self, tag: &str, page: u32)
        -> Result<Vec<AuctionListing>, MarketDataError>;
}

/// Auction source over any [`AuctionFeed`].
pub struct AuctionProvider {
    feed: Arc<dyn AuctionFeed>,
    page_cap: u32,
}

impl AuctionProvider {
    pub fn new(feed: Arc<dyn AuctionFeed>) -> Self {
        Self::with_page_cap(feed, DEFAULT_PAGE_CAP)
    }

    pub fn with_page_cap(feed: Arc<dyn AuctionFeed>, page_cap: u32) -> Self {
        Self {
            feed,
            page_cap: page_cap.max(1),
        }
    }

    /// Scan up to `page_cap` pages for one tag.
    ///
    /// Returns the minimum qualifying bid on the first page that has any,
    /// without reading further pages.
    async fn scan_tag(&self, tag: &str) -> Result<Option<Decimal>, MarketDataError> {
        for page in 0..self.page_cap {
            let listings = self.feed.fetch_page(tag, page).await?;
            if listings.is_empty() {
                debug!("Auction search for {} exhausted at page {}", tag, page);
                return Ok(None);
            }

            if let Some(bid) = lowest_bin(&listings) {
                debug!("Lowest BIN for {} on page {}: {}", tag, page, bid);
                return Ok(Some(bid));
            }
        }

        debug!("No BIN listing for {} within {} pages", tag, self.page_cap);
        Ok(None)
    }
}

#[async_trait]
impl PriceProvider for AuctionProvider {
    fn source(&self) -> PriceSource {
        PriceSource::Auction
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            requires_network: true,
            runes_only: false,
        }
    }

    async fn fetch_price(
        &self,
        item: &ItemIdentifier,
    ) -> Result<Option<PriceCandidate>, MarketDataError> {
        let mut first_error: Option<MarketDataError> = None;

        for (attempt, tag) in item.search_tags().enumerate() {
            match self.scan_tag(tag).await {
                Ok(Some(bid)) => {
                    if attempt > 0 {
                        info!("Used alternate tag {} for '{}'", tag, item.display_name);
                    }
                    return Ok(Some(PriceCandidate::new(bid)));
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Auction search for {} failed: {}", tag, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Minimum qualifying bid over one page of listings, rounded to a tenth.
pub fn lowest_bin(listings: &[AuctionListing]) -> Option<Decimal> {
    listings
        .iter()
        .filter(|l| l.qualifies())
        .filter_map(|l| price_from_f64(l.starting_bid))
        .min()
}
