//! Bazaar order book price source.
//!
//! Values an item at its sell-to-bazaar quote (what a holder would realize)
//! and carries the buy-from-bazaar quote alongside for display.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::errors::MarketDataError;
use crate::models::{price_from_f64, ItemIdentifier, PriceCandidate, PriceSource};
use crate::provider::{PriceProvider, ProviderCapabilities};

/// Live quote for one bazaar product.
#[derive(Clone, Debug, PartialEq)]
pub struct BazaarQuote {
    pub product_id: String,
    /// Price paid when selling into the bazaar.
    pub sell_price: f64,
    /// Price paid when buying from the bazaar.
    pub buy_price: f64,
}

/// Upstream order book: snapshot for a single product tag.
///
/// `Ok(None)` means the tag is not a bazaar product.
#[async_trait]
pub trait BazaarFeed: Send + Sync {
    async fn snapshot(&self, tag: &str) -> Result<Option<BazaarQuote>, MarketDataError>;
}

/// Bazaar source over any [`BazaarFeed`].
pub struct BazaarProvider {
    feed: Arc<dyn BazaarFeed>,
}

impl BazaarProvider {
    pub fn new(feed: Arc<dyn BazaarFeed>) -> Self {
        Self { feed }
    }

    /// Normalize a quote into a candidate.
    ///
    /// The product id must equal the requested tag exactly; a similarly named
    /// product is never accepted.
    pub fn candidate_from_quote(tag: &str, quote: &BazaarQuote) -> Option<PriceCandidate> {
        if quote.product_id != tag {
            debug!(
                "Bazaar returned product {} for tag {}, ignoring",
                quote.product_id, tag
            );
            return None;
        }

        let amount = price_from_f64(quote.sell_price)?;
        let buy_amount = price_from_f64(quote.buy_price);
        Some(PriceCandidate::with_bazaar_buy(amount, buy_amount))
    }
}

#[async_trait]
impl PriceProvider for BazaarProvider {
    fn source(&self) -> PriceSource {
        PriceSource::Bazaar
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
        let tag = item.primary_tag.as_ref();
        let Some(quote) = self.feed.snapshot(tag).await? else {
            debug!("{} is not a bazaar product", tag);
            return Ok(None);
        };

        let candidate = Self::candidate_from_quote(tag, &quote);
        if let Some(c) = &candidate {
            debug!(
                "Bazaar prices for '{}': sell={}, buy={:?}",
                item.display_name, c.amount, c.bazaar_buy_amount
            );
        }
        Ok(candidate)
    }
}
