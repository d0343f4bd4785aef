//! Ordered price source chain.
//!
//! Sources are tried in priority order and the first one that produces a
//! price wins. A failing source never fails the lookup: its error is logged,
//! classified, and treated as "no result".

use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, info, warn};

use super::diagnostics::{AttemptOutcome, ChainDiagnostics, SkipReason};
use super::{CircuitBreaker, SourceHealth};
use crate::errors::RetryClass;
use crate::models::{ItemIdentifier, PriceCandidate, PriceSource, SourceId};
use crate::provider::PriceProvider;

/// The price a source produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceHit {
    pub source: PriceSource,
    pub candidate: PriceCandidate,
}

/// Result of one walk through the chain.
#[derive(Clone, Debug)]
pub struct ChainLookup {
    pub hit: Option<SourceHit>,
    pub diagnostics: ChainDiagnostics,
}

/// Priority-ordered sources guarded by a circuit breaker.
///
/// Upstream request rates are limited below the chain, per HTTP request,
/// by [`Throttled`](crate::provider::Throttled) feeds.
pub struct PriceSourceChain {
    sources: Vec<Arc<dyn PriceProvider>>,
    circuit_breaker: CircuitBreaker,
}

impl PriceSourceChain {
    pub fn new(sources: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self::with_circuit_breaker(sources, CircuitBreaker::new())
    }

    pub fn with_circuit_breaker(
        mut sources: Vec<Arc<dyn PriceProvider>>,
        circuit_breaker: CircuitBreaker,
    ) -> Self {
        // Stable: equal priorities keep registration order
        sources.sort_by_key(|s| s.priority());

        Self {
            sources,
            circuit_breaker,
        }
    }

    /// Ask each applicable source in turn until one has a price.
    pub async fn lookup(&self, item: &ItemIdentifier) -> ChainLookup {
        let mut diagnostics = ChainDiagnostics::new();
        let is_rune = item.is_rune();

        for source in &self.sources {
            let source_id: SourceId = Cow::Borrowed(source.id());
            let capabilities = source.capabilities();

            if capabilities.runes_only && !is_rune {
                diagnostics.record(source_id, AttemptOutcome::Skipped(SkipReason::NotApplicable));
                continue;
            }

            if capabilities.requires_network && !self.circuit_breaker.is_allowed(&source_id) {
                debug!("Circuit open for '{}', skipping", source_id);
                diagnostics.record(
                    source_id,
                    AttemptOutcome::Skipped(SkipReason::CircuitBreakerOpen),
                );
                continue;
            }

            match source.fetch_price(item).await {
                Ok(Some(candidate)) => {
                    self.record_reached(&source_id, capabilities.requires_network);
                    info!(
                        "Priced '{}' at {} from {}",
                        item.display_name, candidate.amount, source_id
                    );
                    diagnostics.record(source_id, AttemptOutcome::Hit);
                    return ChainLookup {
                        hit: Some(SourceHit {
                            source: source.source(),
                            candidate,
                        }),
                        diagnostics,
                    };
                }
                Ok(None) => {
                    self.record_reached(&source_id, capabilities.requires_network);
                    debug!("{} has no price for '{}'", source_id, item.display_name);
                    diagnostics.record(source_id, AttemptOutcome::Miss);
                }
                Err(e) => {
                    if e.retry_class() == RetryClass::FailoverWithPenalty {
                        self.circuit_breaker.record_failure(&source_id);
                        warn!("Source '{}' failed for '{}': {}", source_id, item.display_name, e);
                    } else {
                        warn!("Source '{}' returned no usable price: {}", source_id, e);
                    }
                    diagnostics.record(source_id, AttemptOutcome::Error(e.to_string()));
                }
            }
        }

        debug!(
            "No source priced '{}': {}",
            item.display_name,
            diagnostics.summary()
        );
        ChainLookup {
            hit: None,
            diagnostics,
        }
    }

    fn record_reached(&self, source_id: &SourceId, requires_network: bool) {
        if requires_network {
            self.circuit_breaker.record_success(source_id);
        }
    }

    pub fn health(&self) -> Vec<SourceHealth> {
        self.circuit_breaker.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketDataError;
    use crate::provider::ProviderCapabilities;
    use crate::registry::CircuitState;
    use crate::registry::CircuitBreakerConfig;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behavior {
        Price(Decimal),
        Miss,
        Fail,
        Garbage,
    }

    struct MockSource {
        source: PriceSource,
        runes_only: bool,
        behavior: Behavior,
        call_count: AtomicUsize,
    }

    impl MockSource {
        fn new(source: PriceSource, behavior: Behavior) -> Self {
            Self {
                source,
                runes_only: false,
                behavior,
                call_count: AtomicUsize::new(0),
            }
        }

        fn runes_only(mut self) -> Self {
            self.runes_only = true;
            self
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceProvider for MockSource {
        fn source(&self) -> PriceSource {
            self.source
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                requires_network: true,
                runes_only: self.runes_only,
            }
        }

        async fn fetch_price(
            &self,
            _item: &ItemIdentifier,
        ) -> Result<Option<PriceCandidate>, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Price(amount) => Ok(Some(PriceCandidate::new(*amount))),
                Behavior::Miss => Ok(None),
                Behavior::Fail => Err(MarketDataError::SourceUnavailable {
                    source_id: self.source.id().to_string(),
                    message: "connection refused".to_string(),
                }),
                Behavior::Garbage => Err(MarketDataError::InvalidResponse {
                    source_id: self.source.id().to_string(),
                    message: "expected array".to_string(),
                }),
            }
        }
    }

    fn rune() -> ItemIdentifier {
        ItemIdentifier {
            display_name: "◆ Jerry Rune III".to_string(),
            internal_tag: Arc::from("JERRY_RUNE;3"),
            primary_tag: Arc::from("UNIQUE_RUNE_JERRY"),
            alternate_tag: Some(Arc::from("RUNE_JERRY")),
        }
    }

    fn plain() -> ItemIdentifier {
        ItemIdentifier::plain("Enchanted Diamond", "ENCHANTED_DIAMOND")
    }

    #[tokio::test]
    async fn test_first_hit_wins_and_later_sources_not_called() {
        let auction = Arc::new(MockSource::new(PriceSource::Auction, Behavior::Price(dec!(900))));
        let bazaar = Arc::new(MockSource::new(PriceSource::Bazaar, Behavior::Price(dec!(1))));
        let npc = Arc::new(MockSource::new(PriceSource::Npc, Behavior::Price(dec!(2))).runes_only());

        let chain = PriceSourceChain::new(vec![npc.clone(), bazaar.clone(), auction.clone()]);
        let lookup = chain.lookup(&rune()).await;

        let hit = lookup.hit.unwrap();
        assert_eq!(hit.source, PriceSource::Auction);
        assert_eq!(hit.candidate.amount, dec!(900));
        assert_eq!(auction.calls(), 1);
        assert_eq!(bazaar.calls(), 0);
        assert_eq!(npc.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through_to_next_source() {
        let auction = Arc::new(MockSource::new(PriceSource::Auction, Behavior::Fail));
        let bazaar = Arc::new(MockSource::new(PriceSource::Bazaar, Behavior::Price(dec!(1234.6))));

        let chain = PriceSourceChain::new(vec![auction.clone(), bazaar.clone()]);
        let lookup = chain.lookup(&plain()).await;

        assert_eq!(lookup.hit.unwrap().source, PriceSource::Bazaar);
        assert_eq!(lookup.diagnostics.errors().len(), 1);
        assert_eq!(lookup.diagnostics.called(), vec!["AUCTION", "BAZAAR"]);
    }

    #[tokio::test]
    async fn test_rune_only_source_skipped_for_plain_items() {
        let auction = Arc::new(MockSource::new(PriceSource::Auction, Behavior::Miss));
        let bazaar = Arc::new(MockSource::new(PriceSource::Bazaar, Behavior::Miss));
        let npc = Arc::new(MockSource::new(PriceSource::Npc, Behavior::Price(dec!(5))).runes_only());

        let chain = PriceSourceChain::new(vec![auction, bazaar, npc.clone()]);

        let lookup = chain.lookup(&plain()).await;
        assert!(lookup.hit.is_none());
        assert_eq!(npc.calls(), 0);
        assert_eq!(
            lookup.diagnostics.attempts[2].outcome,
            AttemptOutcome::Skipped(SkipReason::NotApplicable)
        );

        let lookup = chain.lookup(&rune()).await;
        assert_eq!(lookup.hit.unwrap().source, PriceSource::Npc);
        assert_eq!(npc.calls(), 1);
    }

    #[tokio::test]
    async fn test_repeated_failures_open_circuit() {
        let auction = Arc::new(MockSource::new(PriceSource::Auction, Behavior::Fail));
        let breaker = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 2,
            recovery_timeout: Duration::from_secs(60),
            half_open_success_threshold: 1,
        });
        let chain = PriceSourceChain::with_circuit_breaker(vec![auction.clone()], breaker);

        chain.lookup(&plain()).await;
        chain.lookup(&plain()).await;
        assert_eq!(chain.health()[0].state, CircuitState::Open);

        let lookup = chain.lookup(&plain()).await;
        assert!(lookup.hit.is_none());
        assert_eq!(auction.calls(), 2);
        assert_eq!(
            lookup.diagnostics.attempts[0].outcome,
            AttemptOutcome::Skipped(SkipReason::CircuitBreakerOpen)
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_does_not_penalize() {
        let bazaar = Arc::new(MockSource::new(PriceSource::Bazaar, Behavior::Garbage));
        let breaker = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        });
        let chain = PriceSourceChain::with_circuit_breaker(vec![bazaar.clone()], breaker);

        chain.lookup(&plain()).await;
        chain.lookup(&plain()).await;

        assert_eq!(chain.health()[0].state, CircuitState::Closed);
        assert_eq!(bazaar.calls(), 2);
    }

    #[tokio::test]
    async fn test_clean_miss_counts_as_reached() {
        let auction = Arc::new(MockSource::new(PriceSource::Auction, Behavior::Miss));
        let chain = PriceSourceChain::new(vec![auction]);

        let lookup = chain.lookup(&plain()).await;
        assert!(lookup.hit.is_none());
        assert!(lookup.diagnostics.errors().is_empty());
        assert!(chain.health().iter().all(|h| h.consecutive_failures == 0));
    }
}
