use std::collections::VecDeque;

use crate::conflict::{ConflictResolver, Decision, SymbolConflict};
use crate::error::{MergeError, MergeResult};

/// Replays a fixed sequence of decisions, one per conflict.
///
/// Every conflict it is asked about is recorded, so callers can check what
/// the engine presented. Running out of decisions aborts the merge.
#[derive(Clone, Debug, Default)]
pub struct ScriptedResolver {
    script: VecDeque<Decision>,
    seen: Vec<SymbolConflict>,
}

impl ScriptedResolver {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: decisions.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    /// Conflicts presented so far, in order.
    pub fn seen(&self) -> &[SymbolConflict] {
        &self.seen
    }

    /// Decisions not yet used.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ConflictResolver for ScriptedResolver {
    fn resolve(&mut self, conflict: &SymbolConflict) -> MergeResult<Decision> {
        self.seen.push(conflict.clone());
        self.script
            .pop_front()
            .ok_or_else(|| MergeError::ResolverExhausted {
                segment: conflict.segment.clone(),
                address: conflict.address,
            })
    }
}
