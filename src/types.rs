//! Core data types used throughout the navtree library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Input**: [`MenuRecord`], [`DataStatus`] - the flat, parent-referenced
//!   snapshot delivered by the host data source
//! - **Structure**: [`MenuNode`], [`Forest`] - the validated, immutable tree
//! - **Projections**: [`ExpandedIds`], [`ActiveEntry`] - the two pieces of
//!   state that survive a remount through durable storage
//! - **Policy**: [`Layout`], [`FingerprintPolicy`] - caller-selected behavior
//!
//! ## Examples
//!
//! ```rust
//! use navtree::types::MenuRecord;
//!
//! let records = vec![
//!     MenuRecord::new("A", "Admin"),
//!     MenuRecord::new("B", "Users").with_parent("A").with_sort_order(1),
//! ];
//! assert_eq!(records[1].parent_id.as_deref(), Some("A"));
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// One flat record as delivered by the data source
///
/// Field names serialize in camelCase so that host exports can be fed in
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    /// Unique menu id
    pub id: String,
    /// Display label
    #[serde(default)]
    pub name: String,
    /// Parent menu id (None or empty for a root)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Depth as declared by the source; recomputed by the builder
    #[serde(default)]
    pub depth: u32,
    /// Sibling ordering key
    #[serde(default)]
    pub sort_order: i64,
    /// Whether the entry is displayed
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Whether the entry reacts to clicks
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Navigation target (URL or host page reference)
    #[serde(default)]
    pub resource_url: Option<String>,
    /// Kind of resource behind the entry
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Icon reference (CSS class or asset name)
    #[serde(default)]
    pub icon_ref: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MenuRecord {
    /// Create a visible, enabled root record
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            depth: 0,
            sort_order: 0,
            visible: true,
            enabled: true,
            resource_url: None,
            resource_type: None,
            icon_ref: None,
        }
    }

    /// Attach to a parent
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the declared depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the sibling ordering key
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Set the navigation target
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.resource_url = Some(url.into());
        self
    }

    /// Set the resource type
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Set the icon reference
    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }

    /// Mark the record hidden
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark the record disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Parent id with empty strings normalized to `None`
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// One navigation entry inside a [`Forest`]
///
/// Nodes are created by [`crate::tree::build`] and changed only by the
/// functions in [`crate::expansion`], which return new nodes rather than
/// mutating shared ones.
///
/// Dropping, comparing and formatting a node never recurse, so arbitrarily
/// deep parent chains are safe. A node serializes without its children;
/// [`Forest`] serializes as the flat pre-order list of its nodes.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) parent_id: Option<String>,
    pub(crate) depth: u32,
    pub(crate) sort_order: i64,
    pub(crate) visible: bool,
    pub(crate) enabled: bool,
    pub(crate) resource_url: Option<String>,
    pub(crate) resource_type: Option<String>,
    pub(crate) icon_ref: Option<String>,
    pub(crate) expanded: bool,
    #[serde(skip)]
    pub(crate) children: Vec<Arc<MenuNode>>,
}

impl MenuNode {
    /// Menu id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent id, `None` for roots (including promoted orphans)
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Number of ancestors
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sibling ordering key
    pub fn sort_order(&self) -> i64 {
        self.sort_order
    }

    /// Whether the entry is displayed
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the entry reacts to clicks
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Navigation target, if any
    pub fn resource_url(&self) -> Option<&str> {
        self.resource_url.as_deref()
    }

    /// Resource type, if any
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Icon reference, if any
    pub fn icon_ref(&self) -> Option<&str> {
        self.icon_ref.as_deref()
    }

    /// Whether the branch is open
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Ordered children
    pub fn children(&self) -> &[Arc<MenuNode>] {
        &self.children
    }

    /// Whether the node has at least one child
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Copy of this node with a different expansion flag, sharing children
    pub(crate) fn with_expanded(&self, expanded: bool) -> Self {
        let mut copy = self.clone();
        copy.expanded = expanded;
        copy
    }

    /// Every field except `children`
    fn same_entry(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.parent_id == other.parent_id
            && self.depth == other.depth
            && self.sort_order == other.sort_order
            && self.visible == other.visible
            && self.enabled == other.enabled
            && self.resource_url == other.resource_url
            && self.resource_type == other.resource_type
            && self.icon_ref == other.icon_ref
            && self.expanded == other.expanded
    }
}

impl Drop for MenuNode {
    fn drop(&mut self) {
        // Unlink uniquely owned descendants one level at a time
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

impl PartialEq for MenuNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending: Vec<(&MenuNode, &MenuNode)> = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_entry(b) || a.children.len() != b.children.len() {
                return false;
            }
            for (x, y) in a.children.iter().zip(&b.children) {
                if !Arc::ptr_eq(x, y) {
                    pending.push((x.as_ref(), y.as_ref()));
                }
            }
        }
        true
    }
}

impl Eq for MenuNode {}

impl fmt::Debug for MenuNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<&str> = self.children.iter().map(|child| child.id.as_str()).collect();
        f.debug_struct("MenuNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent_id", &self.parent_id)
            .field("depth", &self.depth)
            .field("sort_order", &self.sort_order)
            .field("visible", &self.visible)
            .field("enabled", &self.enabled)
            .field("resource_url", &self.resource_url)
            .field("expanded", &self.expanded)
            .field("children", &children)
            .finish()
    }
}

/// Ordered collection of root nodes: the whole menu
///
/// `Forest` is a cheap-to-clone value. Two forests compare equal when their
/// structure and every node's fields (including `expanded`) match.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Forest {
    pub(crate) roots: Vec<Arc<MenuNode>>,
}

impl fmt::Debug for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for Forest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl Forest {
    /// Create an empty forest
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_roots(roots: Vec<Arc<MenuNode>>) -> Self {
        Self { roots }
    }

    /// Depth-0 nodes in display order
    pub fn roots(&self) -> &[Arc<MenuNode>] {
        &self.roots
    }

    /// Whether the forest has no nodes at all
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Ordered list of expanded menu ids
///
/// Order follows a pre-order walk of the forest it was collected from and is
/// kept so that persisted payloads are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandedIds(Vec<String>);

impl ExpandedIds {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is in the list
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    /// Iterate ids in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume into the inner vector
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ExpandedIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpandedIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// What durable storage knows about the active menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveEntry {
    /// Nothing persisted (first run, unreadable, or storage unavailable)
    Absent,
    /// Explicitly persisted "no active item"
    Cleared,
    /// Persisted active menu id
    Active(String),
}

impl ActiveEntry {
    /// Collapse to an optional id; `Absent` and `Cleared` both map to `None`
    pub fn into_active_id(self) -> Option<String> {
        match self {
            ActiveEntry::Active(id) => Some(id),
            ActiveEntry::Absent | ActiveEntry::Cleared => None,
        }
    }

    /// Whether anything was persisted at all
    pub fn is_present(&self) -> bool {
        !matches!(self, ActiveEntry::Absent)
    }
}

/// Availability signal plus payload from the host data source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataStatus {
    /// Source not bound or failed
    #[default]
    Unavailable,
    /// Source is fetching
    Loading,
    /// Records are ready (possibly empty)
    Available(Vec<MenuRecord>),
}

/// Menu layout, deciding which expansion policy a branch click uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Sidebar; independent (accordion) expansion
    #[default]
    Vertical,
    /// Top bar; one top-level branch open at a time
    Horizontal,
}

/// What goes into the snapshot fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintPolicy {
    /// Ordered ids only; field edits do not trigger a rebuild
    Ids,
    /// Every field of every record, in delivery order
    #[default]
    Content,
}
