/// How the source chain reacts to a failed source lookup.
///
/// Whatever the class, the failed source yields "no result" for the current
/// resolution; the class only decides what is remembered for later calls.
///
/// | Class | Try next source? | Record circuit breaker failure? |
/// |-------|------------------|---------------------------------|
/// | `Never` | Yes | No |
/// | `FailoverWithPenalty` | Yes | Yes |
/// | `NextProvider` | Yes | No |
/// | `CircuitOpen` | Yes (skipped) | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal for this resolution: unknown item or chain exhausted.
    ///
    /// Raised by the resolver and engine, above the chain. Sources do not
    /// return these; the chain would treat one like [`NextProvider`](Self::NextProvider).
    Never,

    /// Upstream unreachable, throttled, or timed out.
    ///
    /// Enough of these in a row open the source's circuit, which excludes
    /// it from the chain until the recovery timeout elapses.
    FailoverWithPenalty,

    /// The upstream answered but the answer was unusable.
    NextProvider,

    /// The source's circuit is open; it was never called.
    CircuitOpen,
}
