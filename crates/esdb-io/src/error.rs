//! Error types for the document crate.

use std::path::PathBuf;

/// Errors that can occur while loading or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or has the wrong field shapes.
    #[error("malformed document {origin}: {message}")]
    Parse { origin: String, message: String },

    /// A symbol references a segment ID the document never declares.
    #[error(
        "segment {segment:#x} is not defined in {origin}, yet symbol {symbol:?} is using it"
    )]
    DanglingSegment {
        origin: String,
        symbol: String,
        segment: u64,
    },

    /// Two segments in one document share an ID.
    #[error("segment ID {id:#x} is declared more than once in {origin}")]
    DuplicateSegmentId { origin: String, id: u64 },

    /// Two segments in one document share a name.
    #[error("segment {name:?} is declared more than once in {origin}")]
    DuplicateSegmentName { origin: String, name: String },

    /// A scalar could not be rendered.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for document results.
pub type DocumentResult<T> = Result<T, DocumentError>;
