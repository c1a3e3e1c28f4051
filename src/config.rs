//! Session configuration and the fluent [`SessionBuilder`]
//!
//! A [`NavConfig`] can be written by hand, loaded from a JSON file with
//! [`NavConfig::from_file`], or assembled through [`SessionBuilder`]:
//!
//! ```rust
//! use navtree::config::SessionBuilder;
//! use navtree::types::Layout;
//!
//! let session = SessionBuilder::new("topbar")
//!     .layout(Layout::Horizontal)
//!     .close_on_navigate(true)
//!     .build()?;
//! assert_eq!(session.config().layout, Layout::Horizontal);
//! # Ok::<(), navtree::NavError>(())
//! ```
//!
//! File form (every field except `instance_key` is optional):
//!
//! ```json
//! {
//!   "instance_key": "sidebar",
//!   "storage": { "kind": "file", "dir": ".navtree" },
//!   "layout": "horizontal",
//!   "fingerprint": "content",
//!   "close_on_navigate": false,
//!   "home_page": "index"
//! }
//! ```

use crate::error::{NavError, Result};
use crate::persistence::{
    DisabledBackend, FileBackend, InstanceKey, MemoryBackend, PersistenceStore, StateBackend,
};
use crate::session::MenuSession;
use crate::types::{FingerprintPolicy, Layout};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default page opened by the home action
pub const DEFAULT_HOME_PAGE: &str = "index";

/// Where persisted state lives
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process memory only
    #[default]
    Memory,
    /// One JSON file per key under `dir`
    File {
        /// State directory
        dir: PathBuf,
    },
    /// Storage switched off; nothing survives a remount
    Disabled,
}

/// Configuration for one menu instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Namespace for persisted state; must not be blank
    pub instance_key: String,
    /// Storage backend
    pub storage: StorageConfig,
    /// Menu layout
    pub layout: Layout,
    /// What the snapshot fingerprint covers
    pub fingerprint: FingerprintPolicy,
    /// Collapse every branch when a leaf navigates
    pub close_on_navigate: bool,
    /// Page opened by the home action
    pub home_page: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            instance_key: String::new(),
            storage: StorageConfig::default(),
            layout: Layout::default(),
            fingerprint: FingerprintPolicy::default(),
            close_on_navigate: false,
            home_page: DEFAULT_HOME_PAGE.to_string(),
        }
    }
}

impl NavConfig {
    /// Default configuration for `instance_key`
    pub fn new(instance_key: impl Into<String>) -> Self {
        Self {
            instance_key: instance_key.into(),
            ..Self::default()
        }
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidConfiguration`] for a blank instance key, a blank
    /// home page or an empty file storage directory.
    pub fn validate(&self) -> Result<()> {
        if self.instance_key.trim().is_empty() {
            return Err(NavError::invalid_config("instance_key must not be empty"));
        }
        if self.home_page.trim().is_empty() {
            return Err(NavError::invalid_config("home_page must not be empty"));
        }
        if let StorageConfig::File { dir } = &self.storage {
            if dir.as_os_str().is_empty() {
                return Err(NavError::invalid_config("storage dir must not be empty"));
            }
        }
        Ok(())
    }

    /// Validated instance key
    pub fn instance_key(&self) -> Result<InstanceKey> {
        InstanceKey::new(self.instance_key.clone())
    }

    /// Open the configured storage backend
    pub fn open_backend(&self) -> Result<Arc<dyn StateBackend>> {
        Ok(match &self.storage {
            StorageConfig::Memory => Arc::new(MemoryBackend::new()),
            StorageConfig::File { dir } => Arc::new(FileBackend::open(dir)?),
            StorageConfig::Disabled => Arc::new(DisabledBackend),
        })
    }

    /// Validate and open a [`PersistenceStore`] for this instance
    pub fn open_store(&self) -> Result<PersistenceStore> {
        self.validate()?;
        Ok(PersistenceStore::new(self.open_backend()?, self.instance_key()?))
    }
}

/// Builder for configuring a [`MenuSession`]
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: NavConfig,
    backend: Option<Arc<dyn StateBackend>>,
}

impl SessionBuilder {
    /// Start from the default configuration for `instance_key`
    pub fn new(instance_key: impl Into<String>) -> Self {
        Self::from_config(NavConfig::new(instance_key))
    }

    /// Start from an existing configuration
    pub fn from_config(config: NavConfig) -> Self {
        Self { config, backend: None }
    }

    /// Set the storage backend kind
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Persist into files under `dir`
    pub fn state_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.storage(StorageConfig::File { dir: dir.into() })
    }

    /// Use a caller-provided backend, overriding [`StorageConfig`]
    ///
    /// Several sessions can share one backend as long as their instance
    /// keys differ.
    pub fn backend(mut self, backend: Arc<dyn StateBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the fingerprint policy
    pub fn fingerprint(mut self, policy: FingerprintPolicy) -> Self {
        self.config.fingerprint = policy;
        self
    }

    /// Collapse all branches when a leaf navigates
    pub fn close_on_navigate(mut self, close: bool) -> Self {
        self.config.close_on_navigate = close;
        self
    }

    /// Set the page opened by the home action
    pub fn home_page(mut self, page: impl Into<String>) -> Self {
        self.config.home_page = page.into();
        self
    }

    /// Configuration collected so far
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Validate the configuration and mount a fresh session
    pub fn build(self) -> Result<MenuSession> {
        let store = match self.backend {
            Some(backend) => {
                self.config.validate()?;
                PersistenceStore::new(backend, self.config.instance_key()?)
            }
            None => self.config.open_store()?,
        };
        Ok(MenuSession::mount(store, self.config))
    }
}
