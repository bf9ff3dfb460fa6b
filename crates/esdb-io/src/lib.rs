//! Document I/O for ESDB symbol databases.
//!
//! The [`loader`] turns a persisted YAML document into a [`SegmentMap`]; the
//! [`writer`] serializes a [`SegmentMap`] back out, assigning fresh segment
//! identifiers and rendering addresses in hexadecimal unless told otherwise.
//!
//! # Key Types
//!
//! - [`RawDocument`] / [`RawSegment`] / [`RawSymbol`] -- Document shape as read
//! - [`ExportDocument`] / [`ExportSegment`] / [`ExportSymbol`] -- Document shape as written
//! - [`WriteOptions`] -- Writer-local formatting options
//!
//! [`SegmentMap`]: esdb_types::SegmentMap

pub mod document;
pub mod error;
pub mod loader;
pub mod writer;

pub use document::{ExportDocument, ExportSegment, ExportSymbol, RawDocument, RawSegment, RawSymbol};
pub use error::{DocumentError, DocumentResult};
pub use loader::{build_segment_map, load_segment_map, parse_segment_map};
pub use writer::{render_segment_map, to_document, write_segment_map, WriteOptions};
