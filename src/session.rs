//! Menu session: reconciliation of upstream snapshots with persisted state
//!
//! A [`MenuSession`] owns the current [`Forest`], the active menu id and the
//! [`PersistenceStore`] of one widget instance. It is fed through
//! [`MenuSession::on_data`] every time the data source reports a new status,
//! and it persists both projections (expanded ids and active id) after every
//! user operation.
//!
//! ## Reconciliation
//!
//! ```text
//! Unavailable / Loading ──────────────────────────────▶ Pending
//! Available(records)
//!   └─ fingerprint == last ──────────────────────────▶ Unchanged
//!   └─ tree::build fails ──── keep old forest ──────▶ Rejected(err)
//!   └─ tree::build ok
//!        ├─ old forest non-empty ─ restore from it ──▶ Rebuilt { Memory }
//!        ├─ persisted ids non-empty ─ restore them ──▶ Rebuilt { Persisted }
//!        └─ otherwise collapsed ─────────────────────▶ Rebuilt { None }
//! ```
//!
//! The active id is taken from storage when an entry exists (including the
//! explicit "none" entry) and kept from memory otherwise.
//!
//! ## Example
//!
//! ```rust
//! use navtree::config::NavConfig;
//! use navtree::persistence::{InstanceKey, PersistenceStore};
//! use navtree::session::{MenuSession, ReconcileOutcome, RestoreSource};
//! use navtree::types::{DataStatus, MenuRecord};
//!
//! let store = PersistenceStore::in_memory(InstanceKey::new("sidebar")?);
//! let records = vec![
//!     MenuRecord::new("A", "Admin"),
//!     MenuRecord::new("B", "Users").with_parent("A").with_depth(1),
//! ];
//!
//! let mut session = MenuSession::mount(store.clone(), NavConfig::new("sidebar"));
//! session.on_data(DataStatus::Available(records.clone()));
//! session.toggle_expand("A");
//!
//! // A new mount over the same storage restores the expansion
//! let mut remounted = MenuSession::mount(store, NavConfig::new("sidebar"));
//! let outcome = remounted.on_data(DataStatus::Available(records));
//! assert_eq!(outcome.restored_from(), Some(RestoreSource::Persisted));
//! assert!(remounted.forest().find("A").unwrap().is_expanded());
//! # Ok::<(), navtree::NavError>(())
//! ```

use crate::config::NavConfig;
use crate::error::ValidationError;
use crate::expansion;
use crate::persistence::PersistenceStore;
use crate::tree::{self, BuildWarning};
use crate::types::{ActiveEntry, DataStatus, ExpandedIds, FingerprintPolicy, Forest, MenuRecord};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, trace, warn};

/// Where the expansion state of a rebuilt forest came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    /// Carried over from the previous in-memory forest
    Memory,
    /// Loaded from durable storage
    Persisted,
    /// Nothing to restore; forest is collapsed
    None,
}

/// Result of feeding one data status into a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Data not ready; nothing changed except the loading flag
    Pending,
    /// Same snapshot as the current forest
    Unchanged,
    /// A new forest replaced the old one
    Rebuilt {
        /// Source of the restored expansion state
        restored_from: RestoreSource,
        /// Non-fatal findings from the build
        warnings: Vec<BuildWarning>,
    },
    /// The snapshot was invalid; the previous forest stays in place
    Rejected(ValidationError),
}

impl ReconcileOutcome {
    /// Whether the forest was replaced
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, ReconcileOutcome::Rebuilt { .. })
    }

    /// Restore source for a rebuild
    pub fn restored_from(&self) -> Option<RestoreSource> {
        match self {
            ReconcileOutcome::Rebuilt { restored_from, .. } => Some(*restored_from),
            _ => None,
        }
    }
}

/// Fingerprint a snapshot as lowercase hex SHA-256
///
/// [`FingerprintPolicy::Ids`] covers the ordered ids only.
/// [`FingerprintPolicy::Content`] covers every field of every record in
/// delivery order. Strings are length-prefixed so adjacent fields cannot
/// run into each other.
pub fn fingerprint(records: &[MenuRecord], policy: FingerprintPolicy) -> String {
    let mut hasher = Sha256::new();
    hasher.update((records.len() as u64).to_le_bytes());

    for record in records {
        hash_str(&mut hasher, &record.id);
        if policy == FingerprintPolicy::Ids {
            continue;
        }
        hash_str(&mut hasher, &record.name);
        hash_opt(&mut hasher, record.parent());
        hasher.update(record.depth.to_le_bytes());
        hasher.update(record.sort_order.to_le_bytes());
        hasher.update([record.visible as u8, record.enabled as u8]);
        hash_opt(&mut hasher, record.resource_url.as_deref());
        hash_opt(&mut hasher, record.resource_type.as_deref());
        hash_opt(&mut hasher, record.icon_ref.as_deref());
    }

    hex::encode(hasher.finalize())
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            hash_str(hasher, value);
        }
        None => hasher.update([0u8]),
    }
}

/// State of one mounted menu instance
#[derive(Debug)]
pub struct MenuSession {
    config: NavConfig,
    store: PersistenceStore,
    forest: Forest,
    active_id: Option<String>,
    /// Fingerprint of the last accepted snapshot; `None` until the first build
    fingerprint: Option<String>,
    loading: bool,
    last_error: Option<ValidationError>,
    warnings: Vec<BuildWarning>,
}

impl MenuSession {
    /// Mount a fresh session with no in-memory forest
    pub fn mount(store: PersistenceStore, config: NavConfig) -> Self {
        info!("Mounted menu session for instance {}", store.instance_key());
        Self {
            config,
            store,
            forest: Forest::new(),
            active_id: None,
            fingerprint: None,
            loading: true,
            last_error: None,
            warnings: Vec::new(),
        }
    }

    /// Feed one status from the data source
    #[instrument(skip(self, status), fields(instance = %self.store.instance_key()))]
    pub fn on_data(&mut self, status: DataStatus) -> ReconcileOutcome {
        let records = match status {
            DataStatus::Unavailable | DataStatus::Loading => {
                self.loading = true;
                return ReconcileOutcome::Pending;
            }
            DataStatus::Available(records) => records,
        };
        self.loading = false;

        let fingerprint = fingerprint(&records, self.config.fingerprint);
        if self.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            trace!("Snapshot unchanged ({} records)", records.len());
            // The forest matches the delivered data again
            self.last_error = None;
            return ReconcileOutcome::Unchanged;
        }

        let output = match tree::build(&records) {
            Ok(output) => output,
            Err(e) => {
                warn!("Rejected menu snapshot: {}", e);
                self.last_error = Some(e.clone());
                return ReconcileOutcome::Rejected(e);
            }
        };

        let (forest, restored_from) = if !self.forest.is_empty() {
            let ids = expansion::collect_expanded_ids(&self.forest);
            (expansion::restore_expansion(&output.forest, &ids), RestoreSource::Memory)
        } else {
            let ids = self.store.load_expanded_ids();
            if ids.is_empty() {
                (output.forest, RestoreSource::None)
            } else {
                (expansion::restore_expansion(&output.forest, &ids), RestoreSource::Persisted)
            }
        };

        match self.store.load_active_entry() {
            ActiveEntry::Active(id) => self.active_id = Some(id),
            ActiveEntry::Cleared => self.active_id = None,
            ActiveEntry::Absent => {}
        }

        debug!(
            "Rebuilt forest: {} nodes, expansion from {:?}, {} warnings",
            forest.len(),
            restored_from,
            output.warnings.len()
        );

        self.forest = forest;
        self.fingerprint = Some(fingerprint);
        self.last_error = None;
        self.warnings = output.warnings.clone();

        ReconcileOutcome::Rebuilt {
            restored_from,
            warnings: output.warnings,
        }
    }

    /// Accordion toggle of one node
    pub fn toggle_expand(&mut self, id: &str) {
        self.forest = expansion::toggle_expand(&self.forest, id);
        self.persist();
    }

    /// Exclusive top-level toggle
    pub fn toggle_top_level_expand(&mut self, id: &str) {
        self.forest = expansion::toggle_top_level_expand(&self.forest, id);
        self.persist();
    }

    /// Expand every node
    pub fn expand_all(&mut self) {
        self.forest = expansion::expand_all(&self.forest, true);
        self.persist();
    }

    /// Collapse every node
    pub fn collapse_all(&mut self) {
        self.forest = expansion::expand_all(&self.forest, false);
        self.persist();
    }

    /// Replace the expansion state with exactly `ids` (stale ids ignored)
    pub fn restore(&mut self, ids: &ExpandedIds) {
        self.forest = expansion::restore_expansion(&self.forest, ids);
        self.persist();
    }

    /// Make `id` the active menu
    pub fn select(&mut self, id: &str) {
        debug!("Selected menu {}", id);
        self.active_id = Some(id.to_string());
        self.persist();
    }

    /// Clear the active menu, persisting the explicit "none" entry
    pub fn clear_active(&mut self) {
        self.active_id = None;
        self.persist();
    }

    /// Collapse everything and drop all persisted state for this instance
    ///
    /// The active id is kept in memory and written back so the next mount
    /// still sees it.
    pub fn reset_expansion(&mut self) {
        self.forest = expansion::expand_all(&self.forest, false);
        self.store.clear();
        self.persist();
    }

    /// Current forest
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Active menu id, if any
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Ids of all expanded nodes, in pre-order
    pub fn expanded_ids(&self) -> ExpandedIds {
        expansion::collect_expanded_ids(&self.forest)
    }

    /// Whether the data source is still loading (or unavailable)
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last validation error; cleared by the next successful rebuild
    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    /// Warnings from the last successful build
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Fingerprint of the last accepted snapshot
    pub fn current_fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Session configuration
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Persistence store of this instance
    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    fn persist(&self) {
        self.store.save_expanded_ids(&self.expanded_ids());
        self.store.save_active_id(self.active_id.as_deref());
    }
}
