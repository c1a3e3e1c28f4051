//! End-to-end scenarios for navtree
//!
//! Drives sessions and controllers through mounts, refreshes and clicks over
//! shared storage, the way a host page would.

use ::navtree::*;
use navtree::navigation::{NavigationOutcome, Navigator, PageParams};
use navtree::persistence::{FileBackend, MemoryBackend};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

/// Navigator that records every call
#[derive(Debug, Default)]
pub struct HostLog {
    pub calls: Mutex<Vec<String>>,
}

impl Navigator for HostLog {
    fn redirect(&self, url: &str) -> navtree::Result<()> {
        self.calls.lock().push(format!("redirect {}", url));
        Ok(())
    }

    fn open_page(&self, page: &str, _params: &PageParams) -> navtree::Result<()> {
        self.calls.lock().push(format!("page {}", page));
        Ok(())
    }
}

/// Test harness: one storage backend that outlives any number of mounts
pub struct MenuHarness {
    pub backend: Arc<dyn StateBackend>,
    pub host: Arc<HostLog>,
    pub instance: String,
}

impl MenuHarness {
    pub fn new(instance: &str) -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
            host: Arc::new(HostLog::default()),
            instance: instance.to_string(),
        }
    }

    pub fn with_backend(instance: &str, backend: Arc<dyn StateBackend>) -> Self {
        Self {
            backend,
            ..Self::new(instance)
        }
    }

    /// Fresh mount with no in-memory state
    pub fn mount(&self, builder: impl FnOnce(SessionBuilder) -> SessionBuilder) -> MenuController {
        let session = builder(SessionBuilder::new(self.instance.clone()).backend(self.backend.clone()))
            .build()
            .unwrap();
        MenuController::new(session, self.host.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.host.calls.lock().clone()
    }
}

fn scenario_a() -> Vec<MenuRecord> {
    vec![
        MenuRecord::new("A", "A"),
        MenuRecord::new("C", "C").with_parent("A").with_depth(1).with_sort_order(1),
        MenuRecord::new("B", "B").with_parent("A").with_depth(1).with_sort_order(0),
    ]
}

fn erp_menu() -> Vec<MenuRecord> {
    vec![
        MenuRecord::new("sales", "Sales"),
        MenuRecord::new("orders", "Orders").with_parent("sales").with_depth(1).with_url("/sales/orders"),
        MenuRecord::new("quotes", "Quotes")
            .with_parent("sales")
            .with_depth(1)
            .with_sort_order(1)
            .with_url("Sales/Quotes.page.xml"),
        MenuRecord::new("stock", "Stock").with_sort_order(1),
        MenuRecord::new("moves", "Moves").with_parent("stock").with_depth(1).with_url("/stock/moves"),
        MenuRecord::new("admin", "Admin").with_sort_order(2),
    ]
}

#[test]
fn test_scenario_a_ordered_children() {
    let forest = tree::build(&scenario_a()).unwrap().forest;

    assert_eq!(forest.roots().len(), 1);
    let root = &forest.roots()[0];
    let children: Vec<_> = root.children().iter().map(|c| c.id()).collect();
    assert_eq!(children, ["B", "C"]);
    assert!(root.children().iter().all(|c| c.depth() == 1));
    assert!(forest.iter().all(|n| !n.is_expanded()));
}

#[test]
fn test_scenario_b_exclusive_top_level() {
    let harness = MenuHarness::new("topbar");
    let mut ctl = harness.mount(|b| b.layout(Layout::Horizontal));
    ctl.on_data(DataStatus::Available(vec![
        MenuRecord::new("X", "X"),
        MenuRecord::new("x1", "x1").with_parent("X").with_depth(1),
        MenuRecord::new("Y", "Y").with_sort_order(1),
        MenuRecord::new("y1", "y1").with_parent("Y").with_depth(1),
    ]));

    ctl.click("X");
    ctl.click("Y");

    let forest = ctl.session().forest();
    assert!(!forest.find("X").unwrap().is_expanded());
    assert!(forest.find("Y").unwrap().is_expanded());
}

#[test]
fn test_scenario_c_restore_after_remount() {
    let harness = MenuHarness::new("sidebar");
    {
        let mut ctl = harness.mount(|b| b);
        ctl.on_data(DataStatus::Available(scenario_a()));
        ctl.click("A");
    }

    let mut ctl = harness.mount(|b| b);
    let outcome = ctl.on_data(DataStatus::Available(scenario_a()));

    assert_eq!(outcome.restored_from(), Some(RestoreSource::Persisted));
    assert!(ctl.session().forest().find("A").unwrap().is_expanded());
}

#[test]
fn test_in_memory_expansion_wins_over_another_mount() {
    let harness = MenuHarness::new("erp");
    let mut first = harness.mount(|b| b);
    first.on_data(DataStatus::Available(erp_menu()));
    first.click("sales");

    // A second mount of the same instance rewrites the stored expansion
    let mut second = harness.mount(|b| b);
    second.on_data(DataStatus::Available(erp_menu()));
    second.click("sales");
    second.click("stock");
    assert_eq!(second.session().store().load_expanded_ids().as_slice(), ["stock"]);

    // The first session's next data tick keeps what it has in memory
    let mut renamed = erp_menu();
    renamed[0].name = "Revenue".to_string();
    let outcome = first.on_data(DataStatus::Available(renamed));

    assert_eq!(outcome.restored_from(), Some(RestoreSource::Memory));
    assert_eq!(first.session().expanded_ids().as_slice(), ["sales"]);
    assert!(!first.session().forest().find("stock").unwrap().is_expanded());
}

#[test]
fn test_full_host_session() {
    let harness = MenuHarness::new("erp");
    let mut ctl = harness.mount(|b| b);

    assert_eq!(ctl.on_data(DataStatus::Loading), ReconcileOutcome::Pending);
    assert!(ctl.session().is_loading());
    assert!(ctl.on_data(DataStatus::Available(erp_menu())).is_rebuilt());

    ctl.click("sales");
    ctl.click("quotes");
    ctl.click("stock");
    ctl.click("moves");
    assert_eq!(ctl.session().expanded_ids().as_slice(), ["sales", "stock"]);
    assert_eq!(ctl.session().active_id(), Some("moves"));

    // Upstream renames an entry; expansion and active entry survive
    let mut renamed = erp_menu();
    renamed[0].name = "Revenue".to_string();
    let outcome = ctl.on_data(DataStatus::Available(renamed));
    assert_eq!(outcome.restored_from(), Some(RestoreSource::Memory));
    assert_eq!(ctl.session().expanded_ids().as_slice(), ["sales", "stock"]);
    assert_eq!(ctl.session().active_id(), Some("moves"));

    assert_eq!(ctl.home(), NavigationOutcome::Delivered);
    assert_eq!(
        harness.calls(),
        ["page Sales/Quotes.page.xml", "redirect /stock/moves", "page index"]
    );

    // Next mount sees the cleared active entry
    let mut next = harness.mount(|b| b);
    next.on_data(DataStatus::Available(erp_menu()));
    assert_eq!(next.session().active_id(), None);
    assert_eq!(next.session().expanded_ids().as_slice(), ["sales", "stock"]);
}

#[test]
fn test_close_on_navigate_persists_collapsed_state() {
    let harness = MenuHarness::new("sidebar");
    let mut ctl = harness.mount(|b| b.close_on_navigate(true));
    ctl.on_data(DataStatus::Available(erp_menu()));
    ctl.click("sales");
    ctl.click("orders");

    let mut next = harness.mount(|b| b);
    let outcome = next.on_data(DataStatus::Available(erp_menu()));

    assert_eq!(outcome.restored_from(), Some(RestoreSource::None));
    assert_eq!(next.session().active_id(), Some("orders"));
}

#[test]
fn test_file_backed_remount() {
    let state_dir = TempDir::new().unwrap();
    let backend: Arc<dyn StateBackend> = Arc::new(FileBackend::open(state_dir.path()).unwrap());
    let harness = MenuHarness::with_backend("sidebar", backend);

    let mut ctl = harness.mount(|b| b);
    ctl.on_data(DataStatus::Available(erp_menu()));
    ctl.open_overlay();
    ctl.click_from_overlay("moves");
    drop(ctl);

    // A separately opened backend over the same directory
    let reopened: Arc<dyn StateBackend> = Arc::new(FileBackend::open(state_dir.path()).unwrap());
    let harness = MenuHarness::with_backend("sidebar", reopened);
    let mut ctl = harness.mount(|b| b);
    ctl.on_data(DataStatus::Available(erp_menu()));

    assert_eq!(ctl.session().active_id(), Some("moves"));
    assert_eq!(ctl.session().expanded_ids().len(), erp_menu().len());
}

#[test]
fn test_invalid_refresh_keeps_working_menu() {
    let harness = MenuHarness::new("sidebar");
    let mut ctl = harness.mount(|b| b);
    ctl.on_data(DataStatus::Available(erp_menu()));
    ctl.click("sales");

    let mut cyclic = erp_menu();
    cyclic[0].parent_id = Some("orders".to_string());
    let outcome = ctl.on_data(DataStatus::Available(cyclic));

    assert!(matches!(outcome, ReconcileOutcome::Rejected(ValidationError::Cycle(_))));
    assert_eq!(ctl.session().forest().len(), erp_menu().len());
    assert_eq!(ctl.click("orders"), ClickOutcome::Selected { navigation: Some(NavigationOutcome::Delivered) });
}

#[tokio::test]
async fn test_feed_drives_session() {
    let mut session = SessionBuilder::new("feed").build().unwrap();
    let (tx, rx) = watch::channel(DataStatus::Unavailable);

    let producer = tokio::spawn(async move {
        tx.send(DataStatus::Loading).unwrap();
        tokio::task::yield_now().await;
        tx.send(DataStatus::Available(erp_menu())).unwrap();
    });

    let summary = navtree::feed::follow(&mut session, rx).await;
    producer.await.unwrap();

    assert!(summary.deliveries >= 1);
    assert_eq!(summary.rejected, 0);
    assert_eq!(session.forest().len(), erp_menu().len());
    assert!(!session.is_loading());
}
