//! Error types for the merge crate.

use esdb_types::Address;

/// Errors that can occur during a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Two symbols in one input segment share an address, so matching by
    /// address would be ambiguous.
    #[error(
        "segment {segment:?} binds both {first:?} and {second:?} to {address}; \
         addresses must be unique within a segment"
    )]
    DuplicateAddress {
        segment: String,
        address: Address,
        first: String,
        second: String,
    },

    /// A scripted resolver ran out of decisions.
    #[error("no decision left for conflict at {address} in segment {segment:?}")]
    ResolverExhausted { segment: String, address: Address },

    /// The resolver produced a decision the engine cannot apply.
    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    /// The interactive prompt hit end of input before a decision was made.
    #[error("conflict prompt closed before a decision was made")]
    PromptClosed,

    /// Reading from or writing to the interactive prompt failed.
    #[error("conflict prompt I/O error: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
