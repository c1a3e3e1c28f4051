//! # navtree - Hierarchical navigation menu engine
//!
//! Builds a navigation tree from flat, parent-referenced menu records and
//! keeps its expand/collapse and active-item state consistent across data
//! refreshes and remounts.
//!
//! ## Overview
//!
//! navtree takes the menu snapshots a host data source delivers and lets you:
//! - Validate them into an ordered, immutable forest (duplicate ids and parent
//!   cycles are rejected, orphans are promoted to roots)
//! - Expand and collapse branches with accordion, exclusive top-level or
//!   expand-all policies
//! - Persist the expanded ids and the active item per widget instance and
//!   restore them after a remount
//! - Route menu clicks to the host's navigation API with a safe fallback
//!
//! ## Architecture
//!
//! ```text
//! DataStatus ──▶ MenuSession::on_data ──▶ tree::build ──▶ Forest
//!                     │                                     │
//!                     │ restore / collect                   ▼
//!                     ├──────────────────────────▶ expansion::* (pure)
//!                     ▼
//!              PersistenceStore ──▶ StateBackend (memory | file | disabled)
//!
//! MenuController::click ──▶ MenuSession ops ──▶ navigation::dispatch ──▶ Navigator
//! ```
//!
//! - **Copy-on-write forest**: every transition returns a new [`Forest`] that
//!   shares all untouched subtrees with the previous one
//! - **Fingerprinted reconciliation**: identical snapshots are skipped, changed
//!   ones are rebuilt with their expansion state carried over
//! - **Best-effort persistence**: storage failures are logged and the menu keeps
//!   working in memory
//!
//! ## Quick Start
//!
//! ```rust
//! use navtree::{DataStatus, MenuRecord, SessionBuilder};
//!
//! let mut session = SessionBuilder::new("sidebar").build()?;
//! session.on_data(DataStatus::Available(vec![
//!     MenuRecord::new("sales", "Sales"),
//!     MenuRecord::new("orders", "Orders").with_parent("sales").with_depth(1).with_url("/orders"),
//! ]));
//!
//! session.toggle_expand("sales");
//! session.select("orders");
//! print!("{}", session.forest().render_outline(session.active_id()));
//! # Ok::<(), navtree::NavError>(())
//! ```
//!
//! ### Handling Clicks
//!
//! ```rust
//! use navtree::{DataStatus, MenuController, MenuRecord, NavError, SessionBuilder};
//! use navtree::navigation::{Navigator, PageParams};
//! use std::sync::Arc;
//!
//! struct Host;
//!
//! impl Navigator for Host {
//!     fn redirect(&self, url: &str) -> navtree::Result<()> {
//!         println!("redirect {}", url);
//!         Ok(())
//!     }
//!
//!     fn open_page(&self, page: &str, _params: &PageParams) -> navtree::Result<()> {
//!         Err(NavError::navigation(format!("no page api for {}", page)))
//!     }
//! }
//!
//! let session = SessionBuilder::new("topbar").build()?;
//! let mut controller = MenuController::new(session, Arc::new(Host));
//! controller.on_data(DataStatus::Available(vec![MenuRecord::new("home", "Home").with_url("/")]));
//! controller.click("home");
//! # Ok::<(), NavError>(())
//! ```
//!
//! ## Error Handling
//!
//! Only two kinds of failure reach the caller: [`ValidationError`] from
//! [`tree::build`] (reported as [`session::ReconcileOutcome::Rejected`] by the
//! session) and [`NavError::InvalidConfiguration`] when a session is built.
//! Storage and navigation errors are recovered where they happen.
//!
//! ## Module Organization
//!
//! - [`types`]: Records, nodes, the forest and policy enums
//! - [`tree`]: Forest construction and queries
//! - [`expansion`]: Expand/collapse transitions
//! - [`persistence`]: Storage backends and the per-instance store
//! - [`session`]: Reconciliation and user operations
//! - [`navigation`]: Navigation targets and host collaborators
//! - [`controller`]: Click handling
//! - [`feed`]: Async data feed
//! - [`config`]: Configuration and builder
//! - [`error`]: Error types and handling

// Public API modules
pub mod config;
pub mod controller;
pub mod error;
pub mod expansion;
pub mod feed;
pub mod navigation;
pub mod persistence;
pub mod session;
pub mod tree;
pub mod types;

// Internal modules (not part of public API)
mod collections;

// Re-export main types for convenience
pub use config::{NavConfig, SessionBuilder, StorageConfig};
pub use controller::{ClickOutcome, MenuController};
pub use error::{NavError, Result, ValidationError};
pub use persistence::{InstanceKey, PersistenceStore, StateBackend};
pub use session::{MenuSession, ReconcileOutcome, RestoreSource};
pub use tree::{BuildOutput, BuildWarning, ForestStats};
pub use types::*;
