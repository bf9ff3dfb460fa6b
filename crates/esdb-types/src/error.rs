use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },
}
