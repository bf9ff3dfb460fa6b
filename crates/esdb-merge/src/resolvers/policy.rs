use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::{ConflictResolver, Decision, SymbolConflict};
use crate::error::MergeResult;

/// A fixed rule for unattended merges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Existing names always win.
    #[default]
    KeepOld,
    /// Incoming names always win.
    KeepNew,
}

impl ConflictPolicy {
    /// The decision this policy makes for every conflict.
    pub fn decision(self) -> Decision {
        match self {
            Self::KeepOld => Decision::KeepOld,
            Self::KeepNew => Decision::KeepNew,
        }
    }
}

/// Resolves every conflict the same way.
#[derive(Clone, Debug, Default)]
pub struct PolicyResolver {
    policy: ConflictPolicy,
}

impl PolicyResolver {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }
}

impl ConflictResolver for PolicyResolver {
    fn resolve(&mut self, conflict: &SymbolConflict) -> MergeResult<Decision> {
        let decision = self.policy.decision();
        debug!(%conflict, %decision, "conflict settled by policy");
        Ok(decision)
    }
}
