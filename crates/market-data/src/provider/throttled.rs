//! Rate-limited feed decorator.
//!
//! Wraps an [`AuctionFeed`] or [`BazaarFeed`] so that every upstream request
//! first takes a token from the source's bucket.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use super::auction::{AuctionFeed, AuctionListing};
use super::bazaar::{BazaarFeed, BazaarQuote};
use super::rate_limiter::RateLimiter;
use crate::errors::MarketDataError;
use crate::models::SourceId;

/// A feed whose requests are paced by a shared [`RateLimiter`].
///
/// ```ignore
/// let limiter = Arc::new(RateLimiter::new());
/// let client = Arc::new(CoflnetClient::new(CoflnetConfig::default()));
/// let auction = AuctionProvider::new(Arc::new(Throttled::new(client, limiter, "AUCTION")));
/// ```
pub struct Throttled<F: ?Sized> {
    inner: Arc<F>,
    limiter: Arc<RateLimiter>,
    source_id: SourceId,
}

impl<F: ?Sized> Throttled<F> {
    pub fn new(inner: Arc<F>, limiter: Arc<RateLimiter>, source_id: &'static str) -> Self {
        Self {
            inner,
            limiter,
            source_id: Cow::Borrowed(source_id),
        }
    }
}

#[async_trait]
impl<F: AuctionFeed + ?Sized> AuctionFeed for Throttled<F> {
    async fn fetch_page(
        &self,
        tag: &str,
        page: u32,
    ) -> Result<Vec<AuctionListing>, MarketDataError> {
        self.limiter.acquire(&self.source_id).await;
        self.inner.fetch_page(tag, page).await
    }
}

#[async_trait]
impl<F: BazaarFeed + ?Sized> BazaarFeed for Throttled<F> {
    async fn snapshot(&self, tag: &str) -> Result<Option<BazaarQuote>, MarketDataError> {
        self.limiter.acquire(&self.source_id).await;
        self.inner.snapshot(tag).await
    }
}
