//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for price resolution
//! - [`RetryClass`]: Classification for how the source chain reacts to a failure
//!
//! None of these errors escape [`PriceResolutionEngine::resolve_price`]; they
//! are downgraded to "no result" at the source boundary and to a stale record
//! (or `None`) at the engine boundary.
//!
//! [`PriceResolutionEngine::resolve_price`]: crate::engine::PriceResolutionEngine::resolve_price

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while resolving an item price.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The display name is not present in the item catalog.
    /// Recoverable: the engine falls back to any cached record.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// A single price source could not be reached or returned garbage.
    /// Recoverable: treated as "no result" and the next source is tried.
    #[error("Source unavailable: {source_id} - {message}")]
    SourceUnavailable {
        /// The source that failed
        source_id: String,
        /// What went wrong
        message: String,
    },

    /// The upstream rejected the request with HTTP 429.
    #[error("Rate limited: {source_id}")]
    RateLimited {
        /// The source that rate limited the request
        source_id: String,
    },

    /// The request to the upstream timed out.
    #[error("Timeout: {source_id}")]
    Timeout {
        /// The source that timed out
        source_id: String,
    },

    /// The upstream answered but the payload could not be interpreted.
    #[error("Invalid response from {source_id}: {message}")]
    InvalidResponse {
        /// The source that returned the payload
        source_id: String,
        /// Parse failure details
        message: String,
    },

    /// The circuit breaker is open for this source.
    #[error("Circuit open: {source_id}")]
    CircuitOpen {
        /// The source with an open circuit
        source_id: String,
    },

    /// Every source in the chain returned no result.
    #[error("All sources exhausted for {0}")]
    AllSourcesExhausted(String),

    /// A network error occurred while talking to an upstream.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: terminal for the resolution, never raised by a source
    /// - [`RetryClass::FailoverWithPenalty`]: next source, and count a circuit failure
    /// - [`RetryClass::NextProvider`]: next source, no penalty
    /// - [`RetryClass::CircuitOpen`]: source skipped by its breaker
    ///
    /// # Examples
    ///
    /// ```
    /// use skyvestments_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { source_id: "AUCTION".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = MarketDataError::UnknownItem("Nope".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::UnknownItem(_) | Self::AllSourcesExhausted(_) => RetryClass::Never,

            Self::SourceUnavailable { .. }
            | Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Network(_) => RetryClass::FailoverWithPenalty,

            Self::InvalidResponse { .. } => RetryClass::NextProvider,

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }

    /// Map a `reqwest` failure onto the taxonomy, keeping timeouts distinct.
    pub(crate) fn from_transport(source_id: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                source_id: source_id.to_string(),
            }
        } else if err.is_decode() {
            Self::InvalidResponse {
                source_id: source_id.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::SourceUnavailable {
                source_id: source_id.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Map a non-success HTTP status onto the taxonomy.
    pub(crate) fn from_status(source_id: &str, status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                source_id: source_id.to_string(),
            }
        } else {
            Self::SourceUnavailable {
                source_id: source_id.to_string(),
                message: format!("HTTP {}", status),
            }
        }
    }
}
