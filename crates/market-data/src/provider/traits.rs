//! Price source trait definitions.
//!
//! This module defines the `PriceProvider` trait shared by the auction,
//! bazaar and NPC sources.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{ItemIdentifier, PriceCandidate, PriceSource};

use super::capabilities::ProviderCapabilities;

/// Trait for price sources.
///
/// A source maps an identifier to an optional price. `Ok(None)` is a clean
/// miss (the item is not listed there); `Err` is a transport or parse
/// failure. The source chain downgrades both to "no result" and moves on.
///
/// # Example
///
/// ```ignore
/// struct FixedPrice(Decimal);
///
/// #[async_trait]
/// impl PriceProvider for FixedPrice {
///     fn source(&self) -> PriceSource {
///         PriceSource::Npc
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities { requires_network: false, runes_only: false }
///     }
///
///     async fn fetch_price(
///         &self,
///         _item: &ItemIdentifier,
///     ) -> Result<Option<PriceCandidate>, MarketDataError> {
///         Ok(Some(PriceCandidate::new(self.0)))
///     }
/// }
/// ```
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Which of the three sources this is.
    fn source(&self) -> PriceSource;

    /// Identifier used for logging and circuit breaker keys.
    fn id(&self) -> &'static str {
        self.source().id()
    }

    /// Chain position. Lower values run first.
    fn priority(&self) -> u8 {
        self.source().priority()
    }

    /// Describes when this source applies.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Look up the current price of an item.
    async fn fetch_price(
        &self,
        item: &ItemIdentifier,
    ) -> Result<Option<PriceCandidate>, MarketDataError>;
}
