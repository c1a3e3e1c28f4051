//! Durable storage for the expanded-id set and the active menu id
//!
//! Storage is split in two layers:
//!
//! - [`StateBackend`] is a tiny string key-value interface that can fail.
//!   [`MemoryBackend`] serves tests and in-memory sessions, [`FileBackend`]
//!   keeps one JSON file per key in a directory, and [`DisabledBackend`]
//!   behaves like storage that the host switched off.
//! - [`PersistenceStore`] sits on top of a backend for one widget instance
//!   and never fails: every backend or payload error is logged and turned
//!   into "nothing persisted".
//!
//! ## Layout
//!
//! ```text
//! navtree::<instance>::expanded  -> {"version":1,"ids":["A","C"],"savedAt":"..."}
//! navtree::<instance>::active    -> {"version":1,"active":"C","savedAt":"..."}
//!                                   {"version":1,"active":null,...}   explicit "none"
//! ```
//!
//! A missing `active` key and an `active: null` payload are different: the
//! first means nothing was ever saved, the second that the user left the menu
//! without an active item.
//!
//! With a [`FileBackend`] each key becomes `<dir>/<percent-encoded key>.json`.

use crate::error::{NavError, Result};
use crate::types::{ActiveEntry, ExpandedIds};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Current payload format version
const PAYLOAD_VERSION: u32 = 1;

/// String key-value storage that may fail
pub trait StateBackend: Send + Sync + fmt::Debug {
    /// Read a value; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key succeeds
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored entry
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StateBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Directory-backed storage, one JSON file per key
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a state directory
    ///
    /// # Errors
    ///
    /// - [`NavError::StateDirUnavailable`] if `root` exists but is not a directory
    /// - [`NavError::Io`] if the directory cannot be created
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(NavError::StateDirUnavailable(root));
        }
        fs::create_dir_all(&root)?;
        info!("Opened state directory {:?}", root);
        Ok(Self { root })
    }

    /// State directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

impl StateBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        trace!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]` so keys map to
/// distinct, portable file names
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Backend for hosts where storage is switched off; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

impl StateBackend for DisabledBackend {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(NavError::StorageDisabled)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(NavError::StorageDisabled)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(NavError::StorageDisabled)
    }
}

/// Explicit namespace for one widget instance's persisted state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceKey(String);

impl InstanceKey {
    /// Create a key; blank keys are rejected so instances never collide by accident
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(NavError::invalid_config("instance key must not be empty"));
        }
        Ok(Self(key))
    }

    /// The raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn storage_key(&self, entry: &str) -> String {
        format!("navtree::{}::{}", self.0, entry)
    }
}

impl TryFrom<String> for InstanceKey {
    type Error = NavError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<InstanceKey> for String {
    fn from(key: InstanceKey) -> Self {
        key.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted expanded-id payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedExpansion {
    /// Payload format version
    pub version: u32,
    /// Expanded ids in pre-order
    pub ids: ExpandedIds,
    /// Save time
    pub saved_at: DateTime<Utc>,
}

/// Persisted active-id payload; `active: None` is the explicit "none" sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedActive {
    /// Payload format version
    pub version: u32,
    /// Active menu id, `None` when explicitly cleared
    pub active: Option<String>,
    /// Save time
    pub saved_at: DateTime<Utc>,
}

/// Accepted shapes for the expansion entry; bare arrays come from older hosts
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpansionPayload {
    Versioned(PersistedExpansion),
    Bare(ExpandedIds),
}

/// Best-effort persistence for one widget instance
///
/// No method returns an error. Failures are logged at `warn` and reads fall
/// back to empty values, so the caller keeps working in memory only.
///
/// # Example
///
/// ```rust
/// use navtree::persistence::{InstanceKey, PersistenceStore};
/// use navtree::types::ExpandedIds;
///
/// let store = PersistenceStore::in_memory(InstanceKey::new("sidebar")?);
/// store.save_expanded_ids(&["A".to_string()].into_iter().collect::<ExpandedIds>());
/// store.save_active_id(Some("B"));
///
/// assert_eq!(store.load_expanded_ids().as_slice(), ["A"]);
/// assert_eq!(store.load_active_id().as_deref(), Some("B"));
/// # Ok::<(), navtree::NavError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    backend: Arc<dyn StateBackend>,
    key: InstanceKey,
}

impl PersistenceStore {
    /// Wrap a backend for one instance
    pub fn new(backend: Arc<dyn StateBackend>, key: InstanceKey) -> Self {
        Self { backend, key }
    }

    /// Store backed by a fresh [`MemoryBackend`]
    pub fn in_memory(key: InstanceKey) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), key)
    }

    /// Instance namespace
    pub fn instance_key(&self) -> &InstanceKey {
        &self.key
    }

    /// Underlying backend
    pub fn backend(&self) -> &Arc<dyn StateBackend> {
        &self.backend
    }

    /// Persist the expanded-id set
    pub fn save_expanded_ids(&self, ids: &ExpandedIds) {
        let payload = PersistedExpansion {
            version: PAYLOAD_VERSION,
            ids: ids.clone(),
            saved_at: Utc::now(),
        };
        self.write(&self.key.storage_key("expanded"), &payload);
    }

    /// Load the expanded-id set; empty when absent or unreadable
    pub fn load_expanded_ids(&self) -> ExpandedIds {
        let key = self.key.storage_key("expanded");
        match self.read::<ExpansionPayload>(&key) {
            Some(ExpansionPayload::Versioned(payload)) => payload.ids,
            Some(ExpansionPayload::Bare(ids)) => ids,
            None => ExpandedIds::new(),
        }
    }

    /// Persist the active id; `None` writes the explicit "none" sentinel
    pub fn save_active_id(&self, id: Option<&str>) {
        let payload = PersistedActive {
            version: PAYLOAD_VERSION,
            active: id.map(str::to_string),
            saved_at: Utc::now(),
        };
        self.write(&self.key.storage_key("active"), &payload);
    }

    /// Load the active entry, distinguishing "never saved" from "saved as none"
    pub fn load_active_entry(&self) -> ActiveEntry {
        let key = self.key.storage_key("active");
        match self.read::<PersistedActive>(&key) {
            Some(PersistedActive { active: Some(id), .. }) => ActiveEntry::Active(id),
            Some(PersistedActive { active: None, .. }) => ActiveEntry::Cleared,
            None => ActiveEntry::Absent,
        }
    }

    /// Load the active id
    pub fn load_active_id(&self) -> Option<String> {
        self.load_active_entry().into_active_id()
    }

    /// Remove both entries for this instance
    pub fn clear(&self) {
        for entry in ["expanded", "active"] {
            let key = self.key.storage_key(entry);
            if let Err(e) = self.backend.remove(&key) {
                warn!("Failed to clear {}: {}", key, e);
            }
        }
        debug!("Cleared persisted state for instance {}", self.key);
    }

    fn write<T: Serialize>(&self, key: &str, payload: &T) {
        let result = serde_json::to_string(payload)
            .map_err(NavError::from)
            .and_then(|json| self.backend.set(key, &json));

        match result {
            Ok(()) => trace!("Persisted {}", key),
            Err(e) => warn!("Failed to persist {}: {}; continuing in memory", key, e),
        }
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let text = match self.backend.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding corrupt payload for {}: {}", key, e);
                // Remove the corrupted entry so the next save starts clean
                self.backend.remove(key).ok();
                None
            }
        }
    }
}
