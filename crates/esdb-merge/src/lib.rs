//! Merge engine for ESDB symbol databases.
//!
//! Reconciles an "old" and a "new" [`SegmentMap`] into a fresh merged map.
//! Segments are matched by name; symbols inside matched segments are matched
//! by address. Two names on one address is a conflict, settled by a
//! [`ConflictResolver`] supplied when the engine is built.
//!
//! # Key Types
//!
//! - [`MergeEngine`] / [`MergeOutcome`] -- The merge itself and its result
//! - [`SymbolConflict`] / [`Decision`] -- A conflict and the choice that settles it
//! - [`ConflictResolver`] -- Pluggable decision source
//! - [`PolicyResolver`] / [`ScriptedResolver`] / [`PromptResolver`] -- Provided resolvers
//! - [`MergeReport`] -- Audit trail of what the merge did
//!
//! [`SegmentMap`]: esdb_types::SegmentMap

pub mod conflict;
pub mod engine;
pub mod error;
pub mod report;
pub mod resolvers;

pub use conflict::{ConflictResolver, Decision, SymbolConflict};
pub use engine::{validate_segment_map, MergeEngine, MergeOutcome};
pub use error::{MergeError, MergeResult};
pub use report::{MergeReport, ResolvedConflict};
pub use resolvers::policy::{ConflictPolicy, PolicyResolver};
pub use resolvers::prompt::{parse_choice, Choice, PromptResolver};
pub use resolvers::scripted::ScriptedResolver;
