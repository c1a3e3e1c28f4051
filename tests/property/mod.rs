//! Property-based testing for navtree
//!
//! Uses proptest to verify tree and expansion invariants across randomly
//! generated menus and operation sequences.

use ::navtree::*;
use navtree::expansion::{
    collect_expanded_ids, expand_all, restore_expansion, toggle_expand, toggle_top_level_expand,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Generate a valid record set of up to `max` records, delivered in random order
///
/// Record `i` may only point at a parent with a smaller index, so the result
/// is always acyclic. Declared depths are computed from the parent chain.
fn menu_strategy(max: usize) -> impl Strategy<Value = Vec<MenuRecord>> {
    prop::collection::vec((any::<bool>(), any::<prop::sample::Index>(), -3i64..3), 1..max)
        .prop_map(|specs| {
            let mut depths: Vec<u32> = Vec::with_capacity(specs.len());
            let mut records = Vec::with_capacity(specs.len());
            for (i, (is_root, parent, sort)) in specs.into_iter().enumerate() {
                let mut record = MenuRecord::new(format!("m{}", i), format!("Menu {}", i)).with_sort_order(sort);
                if i > 0 && !is_root {
                    let p = parent.index(i);
                    record = record.with_parent(format!("m{}", p)).with_depth(depths[p] + 1);
                    depths.push(depths[p] + 1);
                } else {
                    depths.push(0);
                }
                records.push(record);
            }
            records
        })
        .prop_shuffle()
}

/// One user operation on a forest
#[derive(Debug, Clone)]
pub enum ExpandOp {
    Toggle(prop::sample::Index),
    TopLevel(prop::sample::Index),
    ExpandAll,
    CollapseAll,
}

fn op_strategy() -> impl Strategy<Value = ExpandOp> {
    prop_oneof![
        4 => any::<prop::sample::Index>().prop_map(ExpandOp::Toggle),
        2 => any::<prop::sample::Index>().prop_map(ExpandOp::TopLevel),
        1 => Just(ExpandOp::ExpandAll),
        1 => Just(ExpandOp::CollapseAll),
    ]
}

fn apply(forest: &Forest, ids: &[String], op: &ExpandOp) -> Forest {
    match op {
        ExpandOp::Toggle(i) => toggle_expand(forest, &ids[i.index(ids.len())]),
        ExpandOp::TopLevel(i) => toggle_top_level_expand(forest, &ids[i.index(ids.len())]),
        ExpandOp::ExpandAll => expand_all(forest, true),
        ExpandOp::CollapseAll => expand_all(forest, false),
    }
}

fn id_set(forest: &Forest) -> BTreeSet<String> {
    forest.ids().into_iter().map(str::to_string).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Valid record sets build into a forest that satisfies every invariant
    #[test]
    fn build_satisfies_invariants(records in menu_strategy(60)) {
        let output = tree::build(&records).unwrap();
        let forest = &output.forest;

        prop_assert!(forest.invariant_violations().is_empty());
        prop_assert_eq!(forest.len(), records.len());
        prop_assert!(output.warnings.is_empty());
        prop_assert!(forest.iter().all(|n| !n.is_expanded()));

        let expected: BTreeSet<String> = records.iter().map(|r| r.id.clone()).collect();
        prop_assert_eq!(id_set(forest), expected);
    }

    /// Delivery order does not change the built forest
    #[test]
    fn build_ignores_delivery_order(records in menu_strategy(40)) {
        let mut reversed = records.clone();
        reversed.reverse();
        prop_assert_eq!(tree::build(&records).unwrap().forest, tree::build(&reversed).unwrap().forest);
    }

    /// A repeated id is always rejected
    #[test]
    fn duplicate_ids_rejected(records in menu_strategy(30), pick in any::<prop::sample::Index>()) {
        let mut records = records;
        let dup = records[pick.index(records.len())].clone();
        records.push(dup.clone());
        prop_assert_eq!(tree::build(&records).unwrap_err(), ValidationError::DuplicateId(dup.id));
    }

    /// A parent loop anywhere is always rejected
    #[test]
    fn cycles_rejected(records in menu_strategy(30), pick in any::<prop::sample::Index>()) {
        let mut records = records;
        let target = records[pick.index(records.len())].id.clone();
        records.push(MenuRecord::new("loop-a", "a").with_parent("loop-b"));
        records.push(MenuRecord::new("loop-b", "b").with_parent("loop-a"));
        records.push(MenuRecord::new("under-loop", "u").with_parent("loop-a"));
        // Hang an existing node under the loop too
        for record in records.iter_mut() {
            if record.id == target {
                record.parent_id = Some("loop-b".to_string());
            }
        }
        prop_assert!(matches!(tree::build(&records), Err(ValidationError::Cycle(_))));
    }

    /// toggle_expand is an involution
    #[test]
    fn toggle_is_involution(
        records in menu_strategy(40),
        ops in prop::collection::vec(op_strategy(), 0..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut forest = tree::build(&records).unwrap().forest;
        let ids: Vec<String> = forest.ids().into_iter().map(str::to_string).collect();
        for op in &ops {
            forest = apply(&forest, &ids, op);
        }

        let id = &ids[pick.index(ids.len())];
        prop_assert_eq!(toggle_expand(&toggle_expand(&forest, id), id), forest);
    }

    /// At most one root is open after any top-level toggle
    #[test]
    fn top_level_keeps_one_root(
        records in menu_strategy(40),
        ops in prop::collection::vec(op_strategy(), 0..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut forest = tree::build(&records).unwrap().forest;
        let ids: Vec<String> = forest.ids().into_iter().map(str::to_string).collect();
        for op in &ops {
            forest = apply(&forest, &ids, op);
        }

        let forest = toggle_top_level_expand(&forest, &ids[pick.index(ids.len())]);
        let open_roots = forest.roots().iter().filter(|r| r.is_expanded()).count();
        prop_assert!(open_roots <= 1);
        prop_assert!(forest.invariant_violations().is_empty());
    }

    /// expand_all covers every id; collapse covers none
    #[test]
    fn expand_all_covers_everything(records in menu_strategy(40)) {
        let forest = tree::build(&records).unwrap().forest;

        let all: BTreeSet<String> = collect_expanded_ids(&expand_all(&forest, true)).into_vec().into_iter().collect();
        prop_assert_eq!(all, id_set(&forest));
        prop_assert!(collect_expanded_ids(&expand_all(&forest, false)).is_empty());
    }

    /// Stale ids make no difference to a restore
    #[test]
    fn restore_ignores_stale_ids(
        records in menu_strategy(40),
        wanted in prop::collection::vec(0usize..80, 0..30),
    ) {
        let forest = tree::build(&records).unwrap().forest;
        let known = id_set(&forest);

        let ids: types::ExpandedIds = wanted.iter().map(|i| format!("m{}", i)).collect();
        let clean: types::ExpandedIds = ids.iter().filter(|id| known.contains(*id)).collect();

        let restored = restore_expansion(&forest, &ids);
        prop_assert_eq!(&restored, &restore_expansion(&forest, &clean));

        let got: BTreeSet<String> = collect_expanded_ids(&restored).into_vec().into_iter().collect();
        let want: BTreeSet<String> = clean.iter().map(str::to_string).collect();
        prop_assert_eq!(got, want);
    }

    /// collect then restore reproduces the forest exactly
    #[test]
    fn collect_restore_identity(
        records in menu_strategy(40),
        ops in prop::collection::vec(op_strategy(), 0..15),
    ) {
        let mut forest = tree::build(&records).unwrap().forest;
        let ids: Vec<String> = forest.ids().into_iter().map(str::to_string).collect();
        for op in &ops {
            forest = apply(&forest, &ids, op);
        }

        let collapsed = expand_all(&forest, false);
        prop_assert_eq!(restore_expansion(&collapsed, &collect_expanded_ids(&forest)), forest);
    }

    /// A remount over the same storage sees the same expansion and active entry
    #[test]
    fn session_state_survives_remount(
        records in menu_strategy(30),
        ops in prop::collection::vec(op_strategy(), 1..15),
        active in any::<prop::sample::Index>(),
    ) {
        let store = PersistenceStore::in_memory(InstanceKey::new("prop").unwrap());
        let mut session = MenuSession::mount(store.clone(), NavConfig::new("prop"));
        session.on_data(DataStatus::Available(records.clone()));
        let ids: Vec<String> = session.forest().ids().into_iter().map(str::to_string).collect();

        for op in &ops {
            match op {
                ExpandOp::Toggle(i) => session.toggle_expand(&ids[i.index(ids.len())]),
                ExpandOp::TopLevel(i) => session.toggle_top_level_expand(&ids[i.index(ids.len())]),
                ExpandOp::ExpandAll => session.expand_all(),
                ExpandOp::CollapseAll => session.collapse_all(),
            }
        }
        session.select(&ids[active.index(ids.len())]);

        let mut remounted = MenuSession::mount(store, NavConfig::new("prop"));
        remounted.on_data(DataStatus::Available(records));

        prop_assert_eq!(remounted.forest(), session.forest());
        prop_assert_eq!(remounted.active_id(), session.active_id());
    }
}
