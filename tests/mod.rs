//! Main test module for navtree
//!
//! This module includes all test suites:
//! - Integration tests for end-to-end scenarios
//! - Chaos tests for failing storage and navigation
//! - Property-based tests for tree and expansion invariants

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::navtree::*;
    use navtree::expansion;

    #[test]
    fn test_empty_snapshot() {
        let mut session = SessionBuilder::new("main").build().unwrap();
        let outcome = session.on_data(DataStatus::Available(Vec::new()));

        assert!(outcome.is_rebuilt());
        assert!(session.forest().is_empty());
        assert_eq!(session.forest().render_outline(None), "");

        // Operations on an empty forest are harmless
        session.toggle_expand("anything");
        session.expand_all();
        assert!(session.expanded_ids().is_empty());
    }

    #[test]
    fn test_unicode_ids_and_names() {
        let records = vec![
            MenuRecord::new("매출", "매출 관리"),
            MenuRecord::new("주문", "주문 목록").with_parent("매출").with_depth(1),
            MenuRecord::new("🚀", "Launch").with_sort_order(1),
        ];
        let forest = tree::build(&records).unwrap().forest;

        assert_eq!(forest.ids(), ["매출", "주문", "🚀"]);
        let forest = expansion::toggle_expand(&forest, "매출");
        assert!(forest.render_outline(Some("주문")).contains("* 주문 목록 (주문)"));
    }

    #[test]
    fn test_empty_parent_string_is_root() {
        let records = vec![MenuRecord::new("A", "A").with_parent("")];
        let output = tree::build(&records).unwrap();

        assert_eq!(output.forest.roots().len(), 1);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_negative_and_equal_sort_orders() {
        let records = vec![
            MenuRecord::new("b", "b").with_sort_order(-1),
            MenuRecord::new("a", "a").with_sort_order(-1),
            MenuRecord::new("c", "c").with_sort_order(i64::MIN),
            MenuRecord::new("d", "d").with_sort_order(i64::MAX),
        ];
        let forest = tree::build(&records).unwrap().forest;
        assert_eq!(forest.ids(), ["c", "a", "b", "d"]);
    }

    #[test]
    fn test_deep_chain() {
        let depth = 100_000u32;
        let mut records = vec![MenuRecord::new("n0", "n0")];
        for i in 1..depth {
            records.push(
                MenuRecord::new(format!("n{}", i), format!("n{}", i))
                    .with_parent(format!("n{}", i - 1))
                    .with_depth(i),
            );
        }
        let deepest = format!("n{}", depth - 1);

        let store = PersistenceStore::in_memory(InstanceKey::new("deep").unwrap());
        let mut session = MenuSession::mount(store.clone(), NavConfig::new("deep"));
        assert!(session.on_data(DataStatus::Available(records.clone())).is_rebuilt());
        assert!(session.warnings().is_empty());
        assert_eq!(session.forest().stats().max_depth, depth);
        assert_eq!(session.forest().ancestors_of(&deepest).len(), depth as usize - 1);

        session.toggle_expand(&deepest);
        assert_eq!(session.expanded_ids().as_slice(), [deepest.clone()]);

        let toggled = expansion::toggle_expand(session.forest(), &deepest);
        assert_eq!(&toggled, &tree::build(&records).unwrap().forest);

        let mut remounted = MenuSession::mount(store, NavConfig::new("deep"));
        remounted.on_data(DataStatus::Available(records));
        assert_eq!(remounted.forest(), session.forest());

        drop(toggled);
        drop(remounted);
        drop(session);
    }

    #[test]
    fn test_hidden_nodes_are_kept_in_forest() {
        let records = vec![
            MenuRecord::new("A", "A"),
            MenuRecord::new("B", "B").with_parent("A").with_depth(1).hidden(),
        ];
        let forest = tree::build(&records).unwrap().forest;

        assert!(!forest.find("B").unwrap().is_visible());
        assert_eq!(forest.stats().hidden_nodes, 1);
        assert!(forest.render_outline(None).contains("[hidden]"));
    }

    #[test]
    fn test_records_from_host_json() {
        let json = r#"[
            {"id":"1","name":"Home","sortOrder":0,"resourceUrl":"/"},
            {"id":"2","name":"Orders","parentId":"1","depth":1,"resourceUrl":"Orders.page","enabled":false},
            {"id":"3","name":"Lost","parentId":"99"}
        ]"#;
        let records: Vec<MenuRecord> = serde_json::from_str(json).unwrap();
        let output = tree::build(&records).unwrap();

        assert_eq!(output.forest.roots().len(), 2);
        assert!(!output.forest.find("2").unwrap().is_enabled());
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_stale_persisted_ids_ignored() {
        let store = PersistenceStore::in_memory(InstanceKey::new("main").unwrap());
        store.save_expanded_ids(&["A", "removed-long-ago"].into_iter().collect());

        let mut session = MenuSession::mount(store, NavConfig::new("main"));
        session.on_data(DataStatus::Available(vec![
            MenuRecord::new("A", "A"),
            MenuRecord::new("B", "B").with_parent("A").with_depth(1),
        ]));

        assert_eq!(session.expanded_ids().as_slice(), ["A"]);
    }
}
