//! Persisted document shapes.
//!
//! A document is two flat tables: `Segments` (ID, Name, Type) and `Symbols`
//! (Name, Segment, Address), cross-referenced by segment ID. The raw records
//! mirror what is read; the export records are what the writer renders.

use std::fmt;

use esdb_types::{Address, SegmentKind};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// A document as read from disk.
///
/// Either table may be absent; the loader treats a missing table as an empty
/// database rather than an error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "Segments", default)]
    pub segments: Option<Vec<RawSegment>>,
    #[serde(rename = "Symbols", default)]
    pub symbols: Option<Vec<RawSymbol>>,
}

/// One `Segments` entry as read.
#[derive(Clone, Debug, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "ID", deserialize_with = "integer")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: Value,
}

/// One `Symbols` entry as read.
#[derive(Clone, Debug, Deserialize)]
pub struct RawSymbol {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Segment", deserialize_with = "integer")]
    pub segment: u64,
    #[serde(rename = "Address", deserialize_with = "integer")]
    pub address: u64,
}

/// A document ready to be written, with fresh segment identifiers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportDocument {
    pub segments: Vec<ExportSegment>,
    pub symbols: Vec<ExportSymbol>,
}

/// One `Segments` entry as written.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSegment {
    pub id: u64,
    pub name: String,
    pub kind: SegmentKind,
}

/// One `Symbols` entry as written.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSymbol {
    pub address: Address,
    pub name: String,
    pub segment: u64,
}

/// Deserialize an unsigned integer written either as a YAML integer or as a
/// string in any radix [`Address::parse`] understands.
fn integer<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IntegerVisitor)
}

struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer (decimal, 0x hex, 0o octal or 0b binary)")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("integer {v} does not fit in 64 bits")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        Address::parse(v).map(Address::value).map_err(E::custom)
    }
}
