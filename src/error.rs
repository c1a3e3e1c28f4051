//! Error types for the navtree library
//!
//! Two layers of errors exist:
//!
//! - [`ValidationError`] is raised by the tree builder when a flat record
//!   snapshot cannot form a valid forest. It is fatal to one rebuild attempt
//!   only; the session keeps its last good forest.
//! - [`NavError`] is the crate-wide error. Storage and navigation failures are
//!   expressed with it internally, but they are recovered locally and never
//!   reach the host through the session or controller APIs.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the navtree library
pub type Result<T> = std::result::Result<T, NavError>;

/// Structural problems that make a record snapshot unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two records share the same id
    #[error("duplicate menu id: {0}")]
    DuplicateId(String),

    /// A parent chain loops back onto itself
    #[error("parent cycle detected at menu id: {0}")]
    Cycle(String),
}

impl ValidationError {
    /// The offending menu id
    pub fn menu_id(&self) -> &str {
        match self {
            ValidationError::DuplicateId(id) | ValidationError::Cycle(id) => id,
        }
    }
}

/// Main error type for all navtree operations
#[derive(Debug, Error)]
pub enum NavError {
    /// Record snapshot failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors from the file backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage is switched off for this session
    #[error("Storage disabled")]
    StorageDisabled,

    /// State directory missing or not a directory
    #[error("State directory not usable: {0:?}")]
    StateDirUnavailable(PathBuf),

    /// Host navigation API failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// A navigation target that cannot be sent to the host
    #[error("Malformed navigation target: {0:?}")]
    MalformedTarget(String),

    /// Menu id not present in the current forest
    #[error("Menu node not found: {0}")]
    NodeNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl NavError {
    /// Create a storage error with a custom message
    pub fn storage(msg: impl Into<String>) -> Self {
        NavError::Storage(msg.into())
    }

    /// Create a navigation error with a custom message
    pub fn navigation(msg: impl Into<String>) -> Self {
        NavError::Navigation(msg.into())
    }

    /// Create a configuration error with a custom message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        NavError::InvalidConfiguration(msg.into())
    }

    /// Check if the engine can keep running after this error
    ///
    /// Everything except configuration problems is recoverable: storage
    /// degrades to in-memory operation, navigation falls back to `/`, and a
    /// rejected snapshot leaves the previous forest in place.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NavError::InvalidConfiguration(_))
    }

    /// Check if this error came from durable storage
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            NavError::Io(_)
                | NavError::Json(_)
                | NavError::Storage(_)
                | NavError::StorageDisabled
                | NavError::StateDirUnavailable(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            NavError::Validation(ValidationError::DuplicateId(id)) => {
                format!("Menu id '{}' appears more than once. Each menu entry needs a unique id.", id)
            }
            NavError::Validation(ValidationError::Cycle(id)) => {
                format!("Menu '{}' is its own ancestor. Check the parent ids of the entries around it.", id)
            }
            NavError::StateDirUnavailable(path) => {
                format!("State directory {:?} cannot be used. Create it or pass a different --state-dir.", path)
            }
            NavError::NodeNotFound(id) => {
                format!("Menu '{}' not found. Use 'navtree show' to list the available entries.", id)
            }
            _ => self.to_string(),
        }
    }
}
