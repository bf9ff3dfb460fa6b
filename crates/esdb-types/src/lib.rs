//! Foundation types for ESDB symbol databases.
//!
//! An ESDB describes named memory regions ("segments") of a binary and the
//! named addresses ("symbols") that live inside them. Every other ESDB crate
//! depends on `esdb-types`.
//!
//! # Key Types
//!
//! - [`Address`] -- Unsigned symbol address, rendered in hexadecimal
//! - [`SegmentKind`] -- Opaque segment classification carried through unmodified
//! - [`Segment`] -- A named region and its `name -> address` symbol table
//! - [`SegmentMap`] -- All segments of one database, keyed by segment name

pub mod address;
pub mod error;
pub mod segment;

pub use address::Address;
pub use error::TypeError;
pub use segment::{Segment, SegmentKind, SegmentMap};
