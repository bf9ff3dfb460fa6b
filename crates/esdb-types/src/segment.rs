//! Segments and segment maps: the in-memory form of an ESDB.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;

/// Opaque segment classification (the `Type` field of a document).
///
/// The value is never interpreted; it is carried from input to output as-is,
/// whatever YAML shape it had.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentKind(Value);

impl SegmentKind {
    /// Wrap an arbitrary value as a segment kind.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// The underlying value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The tag as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl Default for SegmentKind {
    fn default() -> Self {
        Self(Value::Null)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for SegmentKind {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<Value> for SegmentKind {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A named memory region and the symbols declared inside it.
///
/// Symbol names are unique within a segment (they are the map key) and keep
/// the order they were declared in. Two names sharing one address is
/// representable, but violates the address uniqueness the merge engine relies
/// on; see [`Segment::duplicate_address`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment name, the merge key for segments.
    pub name: String,
    /// Classification tag, never overwritten by a merge.
    pub kind: SegmentKind,
    /// Symbol name to address, in declaration order.
    pub symbols: IndexMap<String, Address>,
}

impl Segment {
    /// Create an empty segment.
    pub fn new(name: impl Into<String>, kind: impl Into<SegmentKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            symbols: IndexMap::new(),
        }
    }

    /// Builder-style symbol insertion.
    pub fn with_symbol(mut self, name: impl Into<String>, address: u64) -> Self {
        self.symbols.insert(name.into(), Address::new(address));
        self
    }

    /// Bind `name` to `address`, returning the address it was previously bound to.
    ///
    /// A rebound name keeps its position; a new name goes last.
    pub fn insert_symbol(&mut self, name: impl Into<String>, address: Address) -> Option<Address> {
        self.symbols.insert(name.into(), address)
    }

    /// Remove a symbol by name, returning its address. Later symbols keep
    /// their relative order.
    pub fn remove_symbol(&mut self, name: &str) -> Option<Address> {
        self.symbols.shift_remove(name)
    }

    /// Address bound to `name`, if any.
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).copied()
    }

    /// All symbol names bound to `address`, in declaration order.
    pub fn names_at(&self, address: Address) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|(_, a)| **a == address)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// The first address shared by two names, with both names.
    ///
    /// Returns `None` when every address in the segment has exactly one name.
    pub fn duplicate_address(&self) -> Option<(Address, &str, &str)> {
        let mut seen: BTreeMap<Address, &str> = BTreeMap::new();
        for (name, address) in &self.symbols {
            if let Some(first) = seen.insert(*address, name.as_str()) {
                return Some((*address, first, name.as_str()));
            }
        }
        None
    }

    /// Symbols ordered by address, then name.
    pub fn symbols_by_address(&self) -> Vec<(&str, Address)> {
        let mut out: Vec<(&str, Address)> = self
            .symbols
            .iter()
            .map(|(n, a)| (n.as_str(), *a))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        out
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the segment declares no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Every segment of one database, keyed by segment name.
///
/// Iteration follows insertion order: the order segments were declared in a
/// loaded document, with segments added later going last. Merging and fresh
/// identifier assignment both follow it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMap {
    segments: IndexMap<String, Segment>,
}

impl SegmentMap {
    /// Create an empty segment map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a segment under its own name, returning any segment it replaced.
    pub fn insert(&mut self, segment: Segment) -> Option<Segment> {
        self.segments.insert(segment.name.clone(), segment)
    }

    /// Look up a segment by name.
    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    /// Mutable lookup by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Segment> {
        self.segments.get_mut(name)
    }

    /// Returns `true` if a segment with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.segments.contains_key(name)
    }

    /// Iterate segments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Segment names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of symbols across all segments.
    pub fn symbol_count(&self) -> usize {
        self.segments.values().map(Segment::len).sum()
    }
}

impl FromIterator<Segment> for SegmentMap {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut map = Self::new();
        for segment in iter {
            map.insert(segment);
        }
        map
    }
}

impl IntoIterator for SegmentMap {
    type Item = Segment;
    type IntoIter = indexmap::map::IntoValues<String, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_values()
    }
}
