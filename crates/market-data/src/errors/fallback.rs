/// How the aggregator's provider chain reacts to an error.
///
/// | Action | Counts as an attempt? | Chain continues? |
/// |--------------------|-----------------------|------------------|
/// | `Skip` | No | Yes |
/// | `Continue` | Yes | Yes |
/// | `RecordAndContinue`| Yes, and remembered | Yes |
/// | `Halt` | n/a | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FallbackAction {
    /// The provider was never really tried (no credential). Does not count
    /// toward the attempt tally.
    Skip,

    /// Soft failure: rate limit, timeout, transport fault or empty answer.
    /// Try the next provider.
    Continue,

    /// The provider does not know the symbol. The miss is tallied so that
    /// a chain where every attempted provider said "unknown symbol" can be
    /// reported as not-found instead of degraded to synthetic data.
    RecordAndContinue,

    /// Terminal: stop walking the chain.
    Halt,
}
