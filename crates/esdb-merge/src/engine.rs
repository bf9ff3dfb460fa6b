//! The merge engine.
//!
//! The result starts as a copy of `old`. Each segment of `new` is either
//! copied in whole (no segment of that name in `old`) or merged symbol by
//! symbol. Within a merged segment every incoming symbol is classified by the
//! number of existing names at its address:
//!
//! - none: the symbol is inserted;
//! - the same name: nothing to do;
//! - a different name: a [`SymbolConflict`] is handed to the resolver and the
//!   decision applied before the next symbol is looked at.
//!
//! More than one existing name at an address cannot happen: both inputs are
//! validated up front and every step keeps one name per address.

use std::collections::BTreeMap;

use esdb_types::{Address, Segment, SegmentMap};
use tracing::{debug, info, warn};

use crate::conflict::{ConflictResolver, Decision, SymbolConflict};
use crate::error::{MergeError, MergeResult};
use crate::report::{MergeReport, ResolvedConflict};

/// The merged map together with the audit trail that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    pub map: SegmentMap,
    pub report: MergeReport,
}

/// Merges segment maps, delegating conflicts to `R`.
pub struct MergeEngine<R> {
    resolver: R,
}

impl<R: ConflictResolver> MergeEngine<R> {
    /// Build an engine around a conflict resolver.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// The resolver this engine consults.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Give back the resolver.
    pub fn into_resolver(self) -> R {
        self.resolver
    }

    /// Merge `new` into a copy of `old`.
    ///
    /// Neither input is modified. Fails before doing any work if either input
    /// binds two names to one address in a segment, and aborts if the
    /// resolver fails.
    pub fn merge(&mut self, old: &SegmentMap, new: &SegmentMap) -> MergeResult<MergeOutcome> {
        validate_segment_map(old)?;
        validate_segment_map(new)?;

        let mut map = old.clone();
        let mut report = MergeReport::new();

        for incoming in new.iter() {
            match map.get_mut(&incoming.name) {
                Some(existing) => {
                    info!(segment = %incoming.name, "matching segment found; merging symbols");
                    self.merge_segment(existing, incoming, &mut report)?;
                    report.segments_merged.push(incoming.name.clone());
                }
                None => {
                    debug!(
                        segment = %incoming.name,
                        symbols = incoming.len(),
                        "segment only in new database; copying"
                    );
                    map.insert(incoming.clone());
                    report.segments_added.push(incoming.name.clone());
                }
            }
        }

        info!(
            segments = map.len(),
            symbols = map.symbol_count(),
            conflicts = report.conflict_count(),
            "merge complete"
        );
        Ok(MergeOutcome { map, report })
    }

    fn merge_segment(
        &mut self,
        target: &mut Segment,
        incoming: &Segment,
        report: &mut MergeReport,
    ) -> MergeResult<()> {
        let mut table = SymbolTable::new(target);

        for (name, &address) in &incoming.symbols {
            match table.name_at(address).map(str::to_owned) {
                None => {
                    if table.bind(name, address) {
                        report.symbols_rebound += 1;
                    }
                    report.symbols_added += 1;
                }
                Some(existing) if existing == *name => {
                    report.symbols_unchanged += 1;
                }
                Some(existing) => {
                    let conflict = SymbolConflict {
                        segment: incoming.name.clone(),
                        address,
                        old_name: existing,
                        new_name: name.clone(),
                    };
                    let decision = self.resolver.resolve(&conflict)?;
                    if apply_decision(&mut table, &conflict, &decision)? {
                        report.symbols_rebound += 1;
                    }
                    debug!(%conflict, %decision, "conflict resolved");
                    report.conflicts.push(ResolvedConflict { conflict, decision });
                }
            }
        }
        Ok(())
    }
}

/// Check that no segment binds two names to one address.
pub fn validate_segment_map(map: &SegmentMap) -> MergeResult<()> {
    for segment in map.iter() {
        if let Some((address, first, second)) = segment.duplicate_address() {
            return Err(MergeError::DuplicateAddress {
                segment: segment.name.clone(),
                address,
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }
    Ok(())
}

/// Apply a decision to the segment being merged.
///
/// Returns `true` if the surviving name was previously bound to another
/// address and moved.
fn apply_decision(
    table: &mut SymbolTable<'_>,
    conflict: &SymbolConflict,
    decision: &Decision,
) -> MergeResult<bool> {
    let replacement = match decision {
        Decision::KeepOld => return Ok(false),
        Decision::KeepNew => conflict.new_name.as_str(),
        Decision::Rename(name) => {
            if name.trim().is_empty() {
                return Err(MergeError::InvalidDecision(format!(
                    "empty rename for {conflict}"
                )));
            }
            name.as_str()
        }
    };

    // Unbind first so renaming back to the old name is a no-op, not a loss.
    table.unbind(&conflict.old_name);
    Ok(table.bind(replacement, conflict.address))
}

/// A segment's symbols plus an address index kept in step with them.
struct SymbolTable<'a> {
    segment: &'a mut Segment,
    by_address: BTreeMap<Address, String>,
}

impl<'a> SymbolTable<'a> {
    fn new(segment: &'a mut Segment) -> Self {
        let by_address = segment
            .symbols
            .iter()
            .map(|(name, address)| (*address, name.clone()))
            .collect();
        Self {
            segment,
            by_address,
        }
    }

    fn name_at(&self, address: Address) -> Option<&str> {
        self.by_address.get(&address).map(String::as_str)
    }

    /// Bind `name` to `address`. A name already bound elsewhere moves, and
    /// its former address is left unnamed. Returns `true` on such a move.
    fn bind(&mut self, name: &str, address: Address) -> bool {
        let mut moved = false;
        if let Some(previous) = self.segment.insert_symbol(name, address) {
            if previous != address {
                self.by_address.remove(&previous);
                warn!(
                    segment = %self.segment.name,
                    symbol = name,
                    from = %previous,
                    to = %address,
                    "symbol name rebound to a new address"
                );
                moved = true;
            }
        }
        self.by_address.insert(address, name.to_string());
        moved
    }

    fn unbind(&mut self, name: &str) {
        if let Some(address) = self.segment.remove_symbol(name) {
            self.by_address.remove(&address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::policy::{ConflictPolicy, PolicyResolver};
    use crate::resolvers::scripted::ScriptedResolver;
    use esdb_types::SegmentKind;
    use proptest::prelude::*;

    fn map(segments: Vec<Segment>) -> SegmentMap {
        segments.into_iter().collect()
    }

    fn conflicting_pair() -> (SegmentMap, SegmentMap) {
        (
            map(vec![Segment::new("text", "Code").with_symbol("foo", 0x1000)]),
            map(vec![Segment::new("text", "Code").with_symbol("bar", 0x1000)]),
        )
    }

    fn merge_with(decisions: Vec<Decision>, old: &SegmentMap, new: &SegmentMap) -> MergeOutcome {
        MergeEngine::new(ScriptedResolver::new(decisions))
            .merge(old, new)
            .unwrap()
    }

    fn symbols(outcome: &MergeOutcome, segment: &str) -> Vec<(String, u64)> {
        outcome
            .map
            .get(segment)
            .unwrap()
            .symbols
            .iter()
            .map(|(n, a)| (n.clone(), a.value()))
            .collect()
    }

    #[test]
    fn identity_merge_is_clean() {
        let db = map(vec![
            Segment::new("text", "Code")
                .with_symbol("main", 0x1000)
                .with_symbol("init", 0x800),
            Segment::new("data", "Data").with_symbol("g", 0x4000),
        ]);
        let outcome = merge_with(vec![], &db, &db);
        assert_eq!(outcome.map, db);
        assert!(outcome.report.is_clean());
        assert_eq!(outcome.report.symbols_unchanged, 3);
        assert_eq!(outcome.report.symbols_added, 0);
    }

    #[test]
    fn disjoint_merge_is_union() {
        let old = map(vec![Segment::new("text", "Code").with_symbol("main", 0x1000)]);
        let new = map(vec![Segment::new("data", "Data").with_symbol("g", 0x4000)]);
        let outcome = merge_with(vec![], &old, &new);

        assert_eq!(outcome.map.len(), 2);
        assert_eq!(outcome.map.get("text"), old.get("text"));
        assert_eq!(outcome.map.get("data"), new.get("data"));
        assert_eq!(outcome.report.segments_added, vec!["data".to_string()]);
        assert!(outcome.report.segments_merged.is_empty());
    }

    #[test]
    fn additive_merge_keeps_old_symbols() {
        let old = map(vec![Segment::new("text", "Code")
            .with_symbol("main", 0x1000)
            .with_symbol("init", 0x800)]);
        let new = map(vec![Segment::new("text", "Code").with_symbol("helper", 0x2000)]);
        let outcome = merge_with(vec![], &old, &new);

        assert_eq!(
            symbols(&outcome, "text"),
            vec![
                ("main".to_string(), 0x1000),
                ("init".to_string(), 0x800),
                ("helper".to_string(), 0x2000),
            ]
        );
        assert_eq!(outcome.report.symbols_added, 1);
        assert_eq!(outcome.report.segments_merged, vec!["text".to_string()]);
    }

    #[test]
    fn conflict_keep_old() {
        let (old, new) = conflicting_pair();
        let outcome = merge_with(vec![Decision::KeepOld], &old, &new);
        assert_eq!(symbols(&outcome, "text"), vec![("foo".to_string(), 0x1000)]);
    }

    #[test]
    fn conflict_keep_new() {
        let (old, new) = conflicting_pair();
        let outcome = merge_with(vec![Decision::KeepNew], &old, &new);
        assert_eq!(symbols(&outcome, "text"), vec![("bar".to_string(), 0x1000)]);
    }

    #[test]
    fn conflict_rename() {
        let (old, new) = conflicting_pair();
        let outcome = merge_with(vec![Decision::Rename("baz".into())], &old, &new);
        assert_eq!(symbols(&outcome, "text"), vec![("baz".to_string(), 0x1000)]);
    }

    #[test]
    fn conflict_is_presented_and_recorded() {
        let (old, new) = conflicting_pair();
        let mut engine = MergeEngine::new(ScriptedResolver::new([Decision::KeepNew]));
        let outcome = engine.merge(&old, &new).unwrap();

        let expected = SymbolConflict {
            segment: "text".into(),
            address: Address::new(0x1000),
            old_name: "foo".into(),
            new_name: "bar".into(),
        };
        assert_eq!(engine.resolver().seen(), &[expected.clone()]);
        assert_eq!(
            outcome.report.conflicts,
            vec![ResolvedConflict {
                conflict: expected,
                decision: Decision::KeepNew,
            }]
        );
    }

    #[test]
    fn rename_back_to_old_name_keeps_symbol() {
        let (old, new) = conflicting_pair();
        let outcome = merge_with(vec![Decision::Rename("foo".into())], &old, &new);
        assert_eq!(symbols(&outcome, "text"), vec![("foo".to_string(), 0x1000)]);
    }

    #[test]
    fn empty_rename_is_rejected() {
        let (old, new) = conflicting_pair();
        let err = MergeEngine::new(ScriptedResolver::new([Decision::Rename("  ".into())]))
            .merge(&old, &new)
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidDecision(_)));
    }

    #[test]
    fn matched_segment_keeps_old_kind() {
        let old = map(vec![Segment::new("text", "Code")]);
        let new = map(vec![Segment::new("text", "Data").with_symbol("f", 0x10)]);
        let outcome = merge_with(vec![], &old, &new);
        assert_eq!(outcome.map.get("text").unwrap().kind, SegmentKind::from("Code"));
    }

    #[test]
    fn inputs_are_not_modified() {
        let (old, new) = conflicting_pair();
        let (old_before, new_before) = (old.clone(), new.clone());
        let _ = merge_with(vec![Decision::KeepNew], &old, &new);
        assert_eq!(old, old_before);
        assert_eq!(new, new_before);
    }

    #[test]
    fn resolutions_are_visible_to_later_symbols() {
        // new visits "a" (0x20) before "c" (0x10). Keeping "a" at 0x20 moves
        // it off 0x10, so "c" finds 0x10 free instead of conflicting with "a".
        let old = map(vec![Segment::new("text", "Code")
            .with_symbol("a", 0x10)
            .with_symbol("b", 0x20)]);
        let new = map(vec![Segment::new("text", "Code")
            .with_symbol("a", 0x20)
            .with_symbol("c", 0x10)]);

        let mut engine = MergeEngine::new(ScriptedResolver::new([Decision::KeepNew]));
        let outcome = engine.merge(&old, &new).unwrap();

        assert_eq!(engine.resolver().seen().len(), 1);
        assert_eq!(
            symbols(&outcome, "text"),
            vec![("a".to_string(), 0x20), ("c".to_string(), 0x10)]
        );
        assert_eq!(outcome.report.symbols_rebound, 1);
        assert_eq!(outcome.report.symbols_added, 1);
    }

    #[test]
    fn moved_symbol_is_rebound_on_insert() {
        let old = map(vec![Segment::new("text", "Code").with_symbol("f", 0x10)]);
        let new = map(vec![Segment::new("text", "Code").with_symbol("f", 0x30)]);
        let outcome = merge_with(vec![], &old, &new);

        assert_eq!(symbols(&outcome, "text"), vec![("f".to_string(), 0x30)]);
        assert_eq!(outcome.report.symbols_rebound, 1);
    }

    #[test]
    fn one_name_per_address_after_merge() {
        let old = map(vec![Segment::new("text", "Code")
            .with_symbol("a", 0x10)
            .with_symbol("b", 0x20)]);
        let new = map(vec![Segment::new("text", "Code")
            .with_symbol("b", 0x10)
            .with_symbol("z", 0x20)]);
        let outcome = merge_with(vec![Decision::KeepNew, Decision::KeepNew], &old, &new);
        assert!(validate_segment_map(&outcome.map).is_ok());
    }

    #[test]
    fn duplicate_address_in_input_is_rejected_before_resolving() {
        let old = map(vec![Segment::new("text", "Code")
            .with_symbol("a", 0x10)
            .with_symbol("alias", 0x10)]);
        let new = map(vec![Segment::new("text", "Code").with_symbol("b", 0x10)]);

        let mut engine = MergeEngine::new(ScriptedResolver::default());
        let err = engine.merge(&old, &new).unwrap_err();
        match err {
            MergeError::DuplicateAddress { segment, address, first, second } => {
                assert_eq!(segment, "text");
                assert_eq!(address, Address::new(0x10));
                assert_eq!((first.as_str(), second.as_str()), ("a", "alias"));
            }
            other => panic!("expected DuplicateAddress, got {other:?}"),
        }
        assert!(engine.resolver().seen().is_empty());

        // The same check applies to the new side.
        assert!(matches!(
            MergeEngine::new(ScriptedResolver::default()).merge(&new, &old),
            Err(MergeError::DuplicateAddress { .. })
        ));
    }

    #[test]
    fn resolver_failure_aborts_merge() {
        let (old, new) = conflicting_pair();
        let err = MergeEngine::new(ScriptedResolver::default())
            .merge(&old, &new)
            .unwrap_err();
        assert!(matches!(err, MergeError::ResolverExhausted { .. }));
    }

    #[test]
    fn empty_side_is_a_no_op() {
        let db = map(vec![Segment::new("text", "Code").with_symbol("main", 0x1000)]);
        let empty = SegmentMap::new();

        assert_eq!(merge_with(vec![], &db, &empty).map, db);
        assert_eq!(merge_with(vec![], &empty, &db).map, db);
    }

    #[test]
    fn conflicts_are_offered_in_declaration_order() {
        let old = map(vec![
            Segment::new("text", "Code")
                .with_symbol("old_z", 0x30)
                .with_symbol("old_a", 0x10),
            Segment::new("bss", "Data").with_symbol("old_b", 0x40),
        ]);
        let new = map(vec![
            Segment::new("text", "Code")
                .with_symbol("new_z", 0x30)
                .with_symbol("new_a", 0x10),
            Segment::new("bss", "Data").with_symbol("new_b", 0x40),
        ]);

        let mut engine = MergeEngine::new(ScriptedResolver::new([
            Decision::KeepOld,
            Decision::KeepOld,
            Decision::KeepOld,
        ]));
        let outcome = engine.merge(&old, &new).unwrap();

        let offered: Vec<&str> = engine
            .resolver()
            .seen()
            .iter()
            .map(|c| c.new_name.as_str())
            .collect();
        assert_eq!(offered, vec!["new_z", "new_a", "new_b"]);
        assert_eq!(outcome.report.segments_merged, vec!["text".to_string(), "bss".to_string()]);
    }

    #[test]
    fn policy_resolver_drives_unattended_merge() {
        let (old, new) = conflicting_pair();
        let outcome = MergeEngine::new(PolicyResolver::new(ConflictPolicy::KeepNew))
            .merge(&old, &new)
            .unwrap();
        assert_eq!(symbols(&outcome, "text"), vec![("bar".to_string(), 0x1000)]);
    }

    fn segment_map_strategy(prefix: &'static str) -> impl Strategy<Value = SegmentMap> {
        prop::collection::btree_map(
            "[a-z]{1,6}",
            prop::collection::btree_map(any::<u16>(), "[a-z_]{1,8}", 0..8),
            0..5,
        )
        .prop_map(move |segments| {
            segments
                .into_iter()
                .map(|(name, symbols)| {
                    symbols.into_iter().fold(
                        Segment::new(format!("{prefix}{name}"), "Code"),
                        |seg, (address, symbol)| seg.with_symbol(symbol, u64::from(address)),
                    )
                })
                .collect::<SegmentMap>()
        })
    }

    proptest! {
        #[test]
        fn identity_merge_property(db in segment_map_strategy("")) {
            let outcome = MergeEngine::new(ScriptedResolver::default()).merge(&db, &db).unwrap();
            prop_assert_eq!(&outcome.map, &db);
            prop_assert!(outcome.report.is_clean());
        }

        #[test]
        fn disjoint_merge_property(
            old in segment_map_strategy("old_"),
            new in segment_map_strategy("new_"),
        ) {
            let outcome = MergeEngine::new(ScriptedResolver::default()).merge(&old, &new).unwrap();
            prop_assert_eq!(outcome.map.len(), old.len() + new.len());
            for segment in old.iter().chain(new.iter()) {
                prop_assert_eq!(outcome.map.get(&segment.name), Some(segment));
            }
        }
    }
}
