//! NPC vendor price source.
//!
//! Last-resort valuation for runes: the fixed price a vendor pays, read
//! from the item catalog. No network access.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::ItemCatalog;
use crate::errors::MarketDataError;
use crate::models::{price_from_f64, ItemIdentifier, PriceCandidate, PriceSource};
use crate::provider::{PriceProvider, ProviderCapabilities};

pub struct NpcProvider {
    catalog: Arc<dyn ItemCatalog>,
}

impl NpcProvider {
    pub fn new(catalog: Arc<dyn ItemCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PriceProvider for NpcProvider {
    fn source(&self) -> PriceSource {
        PriceSource::Npc
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            requires_network: false,
            runes_only: true,
        }
    }

    async fn fetch_price(
        &self,
        item: &ItemIdentifier,
    ) -> Result<Option<PriceCandidate>, MarketDataError> {
        // Keyed by the catalog's own tag, not the upstream form
        Ok(self
            .catalog
            .npc_sell_price(&item.internal_tag)
            .and_then(price_from_f64)
            .map(PriceCandidate::new))
    }
}
