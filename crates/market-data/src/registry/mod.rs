//! Source chain orchestration.
//!
//! - Priority ordering and rune-only filtering of price sources
//! - Circuit breaking for sources that keep failing
//! - Per-lookup diagnostics

mod circuit_breaker;
mod diagnostics;
mod source_chain;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, SourceHealth};
pub use diagnostics::{AttemptOutcome, ChainDiagnostics, SkipReason, SourceAttempt};
pub use source_chain::{ChainLookup, PriceSourceChain, SourceHit};
