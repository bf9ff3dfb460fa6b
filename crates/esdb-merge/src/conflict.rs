//! Conflicts and the [`ConflictResolver`] seam.

use std::fmt;

use esdb_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::MergeResult;

/// Two names for one address in matched segments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConflict {
    /// The segment both symbols live in.
    pub segment: String,
    /// The shared address.
    pub address: Address,
    /// The name currently bound to `address` in the merge result.
    pub old_name: String,
    /// The name the new database uses for `address`.
    pub new_name: String,
}

impl fmt::Display for SymbolConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} old={:?} new={:?}",
            self.segment, self.address, self.old_name, self.new_name
        )
    }
}

/// How a conflict is settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Keep the old name; the new name is dropped.
    KeepOld,
    /// Replace the old name with the new one.
    KeepNew,
    /// Replace the old name with a different name altogether.
    Rename(String),
}

impl Decision {
    /// The name that ends up bound to the conflicting address.
    pub fn resulting_name<'a>(&'a self, conflict: &'a SymbolConflict) -> &'a str {
        match self {
            Self::KeepOld => &conflict.old_name,
            Self::KeepNew => &conflict.new_name,
            Self::Rename(name) => name,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepOld => f.write_str("keep-old"),
            Self::KeepNew => f.write_str("keep-new"),
            Self::Rename(name) => write!(f, "rename({name})"),
        }
    }
}

/// A source of conflict decisions.
///
/// The engine calls `resolve` once per conflict, in merge order, and blocks
/// until it returns. Implementations may prompt a human, apply a fixed rule,
/// or replay a script. Returning an error aborts the merge.
pub trait ConflictResolver {
    /// Decide which name survives at `conflict.address`.
    fn resolve(&mut self, conflict: &SymbolConflict) -> MergeResult<Decision>;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&SymbolConflict) -> MergeResult<Decision>,
{
    fn resolve(&mut self, conflict: &SymbolConflict) -> MergeResult<Decision> {
        self(conflict)
    }
}
