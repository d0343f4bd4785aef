//! Price source capabilities and rate limiting configuration.

/// Describes when a price source applies and what it costs.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Whether lookups leave the process. Offline sources skip the circuit
    /// breaker.
    pub requires_network: bool,

    /// Whether the source is consulted only for rune items.
    pub runes_only: bool,
}

/// Rate limiting configuration for one upstream.
///
/// Controls how aggressively we call an upstream so bulk refreshes do not
/// get the process throttled. Counted in HTTP requests, not item lookups.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests allowed back-to-back before the per-minute rate applies.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}
