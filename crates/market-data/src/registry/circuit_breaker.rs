//! Per-source circuit breaker.
//!
//! Keeps a failing upstream out of the chain for a while instead of paying
//! its timeout on every resolution. Three states:
//!
//! - **Closed**: lookups go through.
//! - **Open**: the source is skipped and counts as "no result".
//! - **HalfOpen**: the recovery timeout elapsed; lookups go through again
//!   and the next outcome decides between Closed and Open.
//!
//! Only transport failures count. A clean "not listed here" miss is a
//! success as far as the breaker is concerned. State is in-memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::SourceId;

/// Consecutive failures before the circuit opens.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Time an open circuit waits before letting a trial request through.
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Successful trial requests needed to close a half-open circuit.
const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 2;

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    trial_successes: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            trial_successes: 0,
            opened_at: None,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// Thread-safe circuit breaker keyed by source id.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// A poisoned lock only means a panic mid-update; the counters are
    /// still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether the source may be called now.
    ///
    /// Moves Open -> HalfOpen once the recovery timeout has elapsed.
    pub fn is_allowed(&self, source: &SourceId) -> bool {
        let mut circuits = self.lock();
        let circuit = circuits
            .entry(source.to_string())
            .or_insert_with(Circuit::closed);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = circuit
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout);
                if recovered {
                    info!("Circuit breaker: '{}' Open -> HalfOpen", source);
                    circuit.state = CircuitState::HalfOpen;
                    circuit.trial_successes = 0;
                }
                recovered
            }
        }
    }

    /// Record a lookup that reached the upstream, hit or clean miss.
    pub fn record_success(&self, source: &SourceId) {
        let mut circuits = self.lock();
        let circuit = circuits
            .entry(source.to_string())
            .or_insert_with(Circuit::closed);

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                circuit.trial_successes += 1;
                debug!(
                    "Circuit breaker: trial success for '{}' ({}/{})",
                    source, circuit.trial_successes, self.config.half_open_success_threshold
                );
                if circuit.trial_successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: '{}' recovered, closing", source);
                    *circuit = Circuit::closed();
                }
            }
            CircuitState::Open => {
                debug!("Circuit breaker: success for '{}' while Open", source);
            }
        }
    }

    /// Record a transport failure.
    ///
    /// Opens the circuit at the threshold; any failure while HalfOpen
    /// reopens it immediately.
    pub fn record_failure(&self, source: &SourceId) {
        let mut circuits = self.lock();
        let circuit = circuits
            .entry(source.to_string())
            .or_insert_with(Circuit::closed);

        circuit.consecutive_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening '{}' after {} failures",
                        source, circuit.consecutive_failures
                    );
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(Instant::now());
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        source, circuit.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!("Circuit breaker: trial request failed for '{}', reopening", source);
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
                circuit.trial_successes = 0;
            }
            CircuitState::Open => {
                circuit.opened_at = Some(Instant::now());
            }
        }
    }

    /// Snapshot of every tracked source.
    pub fn health(&self) -> Vec<SourceHealth> {
        let mut health: Vec<SourceHealth> = self
            .lock()
            .iter()
            .map(|(source, circuit)| SourceHealth {
                source: source.clone(),
                state: circuit.state,
                consecutive_failures: circuit.consecutive_failures,
            })
            .collect();
        health.sort_by(|a, b| a.source.cmp(&b.source));
        health
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Breaker state for one source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceHealth {
    pub source: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
}
