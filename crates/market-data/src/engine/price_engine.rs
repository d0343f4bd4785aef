//! Price resolution engine.
//!
//! Cache check, identifier resolution, source chain, normalization and the
//! stale fallback, in that order. Each call ends in one of the
//! [`ResolutionOutcome`] states.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

use super::EngineConfig;
use crate::cache::{is_stale, PriceCacheStore};
use crate::catalog::ItemCatalog;
use crate::errors::MarketDataError;
use crate::models::{ItemKey, PriceRecord, PriceSource};
use crate::provider::{
    AuctionProvider, BazaarProvider, CoflnetClient, CoflnetConfig, NpcProvider, PriceProvider,
    RateLimiter, Throttled,
};
use crate::registry::{ChainDiagnostics, PriceSourceChain, SourceHealth};
use crate::resolver::{IdentifierResolver, ItemResolver};

/// How a resolution ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "source")]
pub enum ResolutionOutcome {
    /// A fresh cached record was returned; no source was consulted.
    CacheHit,
    /// A source produced a new record, now cached.
    Fetched(PriceSource),
    /// Resolution failed and the last cached record was returned, whatever its age.
    ServedStale,
    /// Resolution failed and nothing was cached.
    Unavailable,
}

/// Record and outcome of one resolution.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub record: Option<PriceRecord>,
    pub outcome: ResolutionOutcome,
    /// What each source did, when the chain was walked.
    pub diagnostics: Option<ChainDiagnostics>,
}

/// Resolves display names to normalized price records.
///
/// Collaborators are injected so each can be swapped for a fake. Concurrent
/// resolutions of the same item are not coalesced: each does its own lookup
/// and the last write wins.
pub struct PriceResolutionEngine {
    resolver: Arc<dyn ItemResolver>,
    chain: PriceSourceChain,
    cache: Arc<dyn PriceCacheStore>,
    config: EngineConfig,
}

impl PriceResolutionEngine {
    pub fn new(
        resolver: Arc<dyn ItemResolver>,
        chain: PriceSourceChain,
        cache: Arc<dyn PriceCacheStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver,
            chain,
            cache,
            config,
        }
    }

    /// Engine wired to the Coflnet API for auction and bazaar prices and to
    /// `catalog` for identifiers and NPC prices.
    ///
    /// Every Coflnet request takes a token from its source's bucket.
    pub fn with_coflnet(
        catalog: Arc<dyn ItemCatalog>,
        cache: Arc<dyn PriceCacheStore>,
        coflnet: CoflnetConfig,
        config: EngineConfig,
    ) -> Self {
        let auction_id = PriceSource::Auction.id();
        let bazaar_id = PriceSource::Bazaar.id();

        let limiter = Arc::new(RateLimiter::new());
        limiter.configure(&Cow::Borrowed(auction_id), coflnet.auction_rate_limit.clone());
        limiter.configure(&Cow::Borrowed(bazaar_id), coflnet.bazaar_rate_limit.clone());

        let client = Arc::new(CoflnetClient::new(coflnet));
        let auction_feed = Throttled::new(client.clone(), limiter.clone(), auction_id);
        let bazaar_feed = Throttled::new(client, limiter, bazaar_id);

        let sources: Vec<Arc<dyn PriceProvider>> = vec![
            Arc::new(AuctionProvider::with_page_cap(
                Arc::new(auction_feed),
                config.auction_page_cap,
            )),
            Arc::new(BazaarProvider::new(Arc::new(bazaar_feed))),
            Arc::new(NpcProvider::new(catalog.clone())),
        ];

        Self::new(
            Arc::new(IdentifierResolver::new(catalog)),
            PriceSourceChain::new(sources),
            cache,
            config,
        )
    }

    /// Current price of an item, or `None` when it cannot be priced and was
    /// never priced before.
    pub async fn resolve_price(&self, display_name: &str) -> Option<PriceRecord> {
        self.resolve_price_detailed(display_name).await.record
    }

    /// [`resolve_price`](Self::resolve_price) with the terminal state attached.
    pub async fn resolve_price_detailed(&self, display_name: &str) -> Resolution {
        let key = ItemKey::from_display_name(display_name);
        let cached = self.cache.get(&key);

        if let Some(record) = &cached {
            if !is_stale(record, self.config.price_ttl, Utc::now()) {
                debug!("Cache hit for '{}' ({})", display_name, key);
                return Resolution {
                    record: Some(PriceRecord::clone(record)),
                    outcome: ResolutionOutcome::CacheHit,
                    diagnostics: None,
                };
            }
        }

        let item = match self.resolver.resolve(display_name) {
            Ok(item) => item,
            Err(e) => return Self::fall_back(cached, e, None),
        };

        let lookup = self.chain.lookup(&item).await;
        let Some(hit) = lookup.hit else {
            return Self::fall_back(
                cached,
                MarketDataError::AllSourcesExhausted(display_name.to_string()),
                Some(lookup.diagnostics),
            );
        };

        let record =
            PriceRecord::from_candidate(item.display_name, hit.source, hit.candidate, Utc::now());
        self.cache.put(key, record.clone());

        Resolution {
            record: Some(record),
            outcome: ResolutionOutcome::Fetched(hit.source),
            diagnostics: Some(lookup.diagnostics),
        }
    }

    fn fall_back(
        cached: Option<Arc<PriceRecord>>,
        cause: MarketDataError,
        diagnostics: Option<ChainDiagnostics>,
    ) -> Resolution {
        let attempts = diagnostics
            .as_ref()
            .map(|d| format!(" [{}]", d.summary()))
            .unwrap_or_default();

        match cached {
            Some(record) => {
                info!(
                    "{}{}; serving cached price from {}",
                    cause, attempts, record.captured_at
                );
                Resolution {
                    record: Some(PriceRecord::clone(&record)),
                    outcome: ResolutionOutcome::ServedStale,
                    diagnostics,
                }
            }
            None => {
                debug!("{}{}; no cached price", cause, attempts);
                Resolution {
                    record: None,
                    outcome: ResolutionOutcome::Unavailable,
                    diagnostics,
                }
            }
        }
    }

    /// Resolve each distinct name in turn, one item at a time.
    ///
    /// Names are de-duplicated keeping first-seen order; the result follows
    /// that order.
    pub async fn refresh_all<I, S>(&self, names: I) -> Vec<(String, Option<PriceRecord>)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for name in names {
            let name = name.as_ref();
            if !seen.insert(name.to_string()) {
                continue;
            }
            let record = self.resolve_price(name).await;
            results.push((name.to_string(), record));
        }

        let priced = results.iter().filter(|(_, r)| r.is_some()).count();
        if priced < results.len() {
            warn!(
                "Batch refresh priced {}/{} items",
                priced,
                results.len()
            );
        } else {
            info!("Batch refresh priced {} items", priced);
        }
        results
    }

    pub fn cache(&self) -> &Arc<dyn PriceCacheStore> {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source_health(&self) -> Vec<SourceHealth> {
        self.chain.health()
    }
}
