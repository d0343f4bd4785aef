//! Per-lookup record of what each source did.

use crate::models::SourceId;

/// Why a source was not called.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// The source only prices runes and the item is not one.
    NotApplicable,

    /// The source's circuit breaker is open.
    CircuitBreakerOpen,
}

/// What happened when the chain reached one source.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Hit,
    Miss,
    Error(String),
    Skipped(SkipReason),
}

#[derive(Clone, Debug)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub outcome: AttemptOutcome,
}

/// Ordered attempts for one lookup through the chain.
#[derive(Clone, Debug, Default)]
pub struct ChainDiagnostics {
    pub attempts: Vec<SourceAttempt>,
}

impl ChainDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, source: SourceId, outcome: AttemptOutcome) {
        self.attempts.push(SourceAttempt { source, outcome });
    }

    /// `AUCTION: ERROR (Timeout: AUCTION) -> BAZAAR: MISS -> ...`
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Hit => format!("{}: HIT", a.source),
                AttemptOutcome::Miss => format!("{}: MISS", a.source),
                AttemptOutcome::Error(e) => format!("{}: ERROR ({})", a.source, e),
                AttemptOutcome::Skipped(reason) => format!("{}: SKIPPED ({:?})", a.source, reason),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Sources that were actually called.
    pub fn called(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, AttemptOutcome::Skipped(_)))
            .map(|a| a.source.as_ref())
            .collect()
    }

    pub fn errors(&self) -> Vec<(&SourceId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Error(e) => Some((&a.source, e.as_str())),
                _ => None,
            })
            .collect()
    }
}
