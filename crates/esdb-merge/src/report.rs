//! Merge audit trail.

use serde::{Deserialize, Serialize};

use crate::conflict::{Decision, SymbolConflict};

/// A conflict together with the decision applied to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub conflict: SymbolConflict,
    pub decision: Decision,
}

impl ResolvedConflict {
    /// The name bound to the conflicting address after the decision.
    pub fn surviving_name(&self) -> &str {
        self.decision.resulting_name(&self.conflict)
    }
}

/// What a merge did, in the order it did it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Segments present only in the new database, copied in whole.
    pub segments_added: Vec<String>,
    /// Segments present in both databases whose symbols were merged.
    pub segments_merged: Vec<String>,
    /// New symbols inserted at addresses the old segment did not name.
    pub symbols_added: usize,
    /// New symbols already present with the same name and address.
    pub symbols_unchanged: usize,
    /// Names that moved to a different address because an insert or a
    /// decision reused a name already bound elsewhere in the segment.
    pub symbols_rebound: usize,
    /// Every conflict, in resolution order.
    pub conflicts: Vec<ResolvedConflict>,
}

impl MergeReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conflicts raised.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Returns `true` if the merge raised no conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts settled with a given kind of decision.
    pub fn count_decisions(&self, matches: impl Fn(&Decision) -> bool) -> usize {
        self.conflicts.iter().filter(|c| matches(&c.decision)).count()
    }
}
