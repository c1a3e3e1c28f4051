//! Forest construction from flat, parent-referenced records
//!
//! [`build`] turns a record snapshot into a validated [`Forest`]. It either
//! returns a complete forest, fully collapsed, or a [`ValidationError`]; a
//! partially assembled structure never escapes.
//!
//! ## Structure
//!
//! ```text
//! A (sort 0)
//! ├── B (sort 0)
//! └── C (sort 1)
//!     └── D
//! X (orphan, parent "gone" missing -> promoted to root)
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use navtree::tree;
//! use navtree::types::MenuRecord;
//!
//! let output = tree::build(&[
//!     MenuRecord::new("A", "Admin"),
//!     MenuRecord::new("C", "Roles").with_parent("A").with_depth(1).with_sort_order(1),
//!     MenuRecord::new("B", "Users").with_parent("A").with_depth(1),
//! ])?;
//!
//! let root = &output.forest.roots()[0];
//! let names: Vec<_> = root.children().iter().map(|c| c.id()).collect();
//! assert_eq!(names, ["B", "C"]);
//! assert!(output.warnings.is_empty());
//! # Ok::<(), navtree::ValidationError>(())
//! ```

use crate::collections::{id_map_with_capacity, id_set_with_capacity, IdMap};
use crate::error::ValidationError;
use crate::types::{Forest, MenuNode, MenuRecord};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Non-fatal findings from a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// Record referenced a parent that is not in the snapshot
    OrphanPromoted {
        /// Promoted record
        id: String,
        /// Parent id that could not be resolved
        missing_parent: String,
    },
    /// Declared depth disagreed with the position in the tree
    DepthMismatch {
        /// Affected record
        id: String,
        /// Depth carried by the record
        declared: u32,
        /// Depth computed from the parent chain
        actual: u32,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::OrphanPromoted { id, missing_parent } => {
                write!(f, "menu {} references missing parent {}; promoted to root", id, missing_parent)
            }
            BuildWarning::DepthMismatch { id, declared, actual } => {
                write!(f, "menu {} declares depth {} but sits at depth {}", id, declared, actual)
            }
        }
    }
}

/// Result of a successful [`build`]
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// The assembled, fully collapsed forest
    pub forest: Forest,
    /// Findings that did not prevent the build
    pub warnings: Vec<BuildWarning>,
}

/// Build a validated forest from a flat record snapshot
///
/// # Errors
///
/// - [`ValidationError::DuplicateId`] as soon as a second record with an
///   already-seen id is encountered
/// - [`ValidationError::Cycle`] if any parent chain loops
pub fn build(records: &[MenuRecord]) -> Result<BuildOutput, ValidationError> {
    // Pass 1: id index
    let mut index: IdMap<usize> = id_map_with_capacity(records.len());
    for (pos, record) in records.iter().enumerate() {
        if index.insert(record.id.clone(), pos).is_some() {
            return Err(ValidationError::DuplicateId(record.id.clone()));
        }
    }

    // Pass 2: attach to parents
    let mut warnings = Vec::new();
    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for (pos, record) in records.iter().enumerate() {
        match record.parent() {
            None => roots.push(pos),
            Some(parent_id) => match index.get(parent_id) {
                Some(&parent_pos) => children[parent_pos].push(pos),
                None => {
                    warn!("Menu {} references missing parent {}, promoting to root", record.id, parent_id);
                    warnings.push(BuildWarning::OrphanPromoted {
                        id: record.id.clone(),
                        missing_parent: parent_id.to_string(),
                    });
                    roots.push(pos);
                }
            },
        }
    }

    let by_sibling_order = |a: &usize, b: &usize| sibling_order(&records[*a], &records[*b]);
    roots.sort_by(by_sibling_order);
    for list in &mut children {
        list.sort_by(by_sibling_order);
    }

    let mut assembler = Assembler {
        records,
        children: &children,
        reached: vec![false; records.len()],
        warnings: &mut warnings,
    };
    let root_nodes: Vec<_> = roots.iter().map(|&pos| assembler.assemble(pos)).collect();

    // Anything unreached hangs off a parent chain that never reaches a root
    if let Some(pos) = assembler.reached.iter().position(|reached| !reached) {
        let cycle_id = find_cycle(records, &index, pos);
        debug!("Rejecting snapshot: parent cycle through {}", cycle_id);
        return Err(ValidationError::Cycle(cycle_id));
    }

    debug!("Built forest with {} records, {} roots", records.len(), root_nodes.len());
    Ok(BuildOutput {
        forest: Forest::from_roots(root_nodes),
        warnings,
    })
}

/// Sibling order: `sort_order` ascending, then id as a stable tiebreak
fn sibling_order(a: &MenuRecord, b: &MenuRecord) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.id.cmp(&b.id))
}

struct Assembler<'a> {
    records: &'a [MenuRecord],
    children: &'a [Vec<usize>],
    reached: Vec<bool>,
    warnings: &'a mut Vec<BuildWarning>,
}

/// A node whose children are still being assembled
struct Pending {
    pos: usize,
    depth: u32,
    children: Vec<Arc<MenuNode>>,
}

impl<'a> Assembler<'a> {
    /// Assemble the subtree under `root` bottom-up, keeping the open
    /// ancestors on an explicit stack
    ///
    /// Every record sits in exactly one child list, so a descent from a root
    /// visits each record at most once and cannot loop. Records on a parent
    /// cycle are simply never reached.
    fn assemble(&mut self, root: usize) -> Arc<MenuNode> {
        let lists = self.children;
        let mut current = self.enter(root, 0);
        let mut ancestors: Vec<Pending> = Vec::new();

        loop {
            if let Some(&child) = lists[current.pos].get(current.children.len()) {
                let next = self.enter(child, current.depth + 1);
                ancestors.push(std::mem::replace(&mut current, next));
                continue;
            }

            let node = self.finish(current);
            match ancestors.pop() {
                Some(mut parent) => {
                    parent.children.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }

    fn enter(&mut self, pos: usize, depth: u32) -> Pending {
        let records = self.records;
        let record = &records[pos];
        self.reached[pos] = true;

        if record.depth != depth {
            trace!("Menu {} declared depth {}, computed {}", record.id, record.depth, depth);
            self.warnings.push(BuildWarning::DepthMismatch {
                id: record.id.clone(),
                declared: record.depth,
                actual: depth,
            });
        }

        Pending {
            pos,
            depth,
            children: Vec::with_capacity(self.children[pos].len()),
        }
    }

    fn finish(&self, pending: Pending) -> Arc<MenuNode> {
        let record = &self.records[pending.pos];
        let depth = pending.depth;
        Arc::new(MenuNode {
            id: record.id.clone(),
            name: record.name.clone(),
            parent_id: if depth == 0 { None } else { record.parent().map(str::to_string) },
            depth,
            sort_order: record.sort_order,
            visible: record.visible,
            enabled: record.enabled,
            resource_url: record.resource_url.clone(),
            resource_type: record.resource_type.clone(),
            icon_ref: record.icon_ref.clone(),
            expanded: false,
            children: pending.children,
        })
    }
}

/// Walk the parent chain from `start` and return the first id seen twice
fn find_cycle(records: &[MenuRecord], index: &IdMap<usize>, start: usize) -> String {
    let mut visited = id_set_with_capacity(8);
    let mut current = start;

    loop {
        let record = &records[current];
        if !visited.insert(record.id.clone()) {
            return record.id.clone();
        }
        match record.parent().and_then(|parent_id| index.get(parent_id)) {
            Some(&parent_pos) => current = parent_pos,
            // Unreached records always resolve their parent
            None => return records[start].id.clone(),
        }
    }
}

/// Pre-order iterator over a forest
pub struct PreOrder<'a> {
    stack: Vec<&'a Arc<MenuNode>>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a MenuNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node.as_ref())
    }
}

/// Move the innermost frame of a path search to its next sibling
fn advance(frames: &mut [(&[Arc<MenuNode>], usize)]) {
    if let Some(frame) = frames.last_mut() {
        frame.1 += 1;
    }
}

impl Forest {
    /// Iterate every node in pre-order (parent before children, siblings in order)
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Find a node by id
    pub fn find(&self, id: &str) -> Option<&MenuNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Whether a node with `id` exists
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// All ids in pre-order
    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|node| node.id.as_str()).collect()
    }

    /// Child-index path from the root list to `id`
    ///
    /// `[2, 0]` means `roots[2].children[0]`.
    pub(crate) fn index_path(&self, id: &str) -> Option<Vec<usize>> {
        // One frame per level: the sibling list and the position within it
        let mut frames: Vec<(&[Arc<MenuNode>], usize)> = vec![(self.roots.as_slice(), 0)];

        while let Some(&(level, i)) = frames.last() {
            let Some(node) = level.get(i) else {
                frames.pop();
                advance(&mut frames);
                continue;
            };
            if node.id == id {
                return Some(frames.iter().map(|&(_, i)| i).collect());
            }
            if node.children.is_empty() {
                advance(&mut frames);
            } else {
                frames.push((node.children.as_slice(), 0));
            }
        }
        None
    }

    /// Ancestors of `id`, from its root down to its parent
    ///
    /// Empty for roots and for unknown ids.
    pub fn ancestors_of(&self, id: &str) -> Vec<&MenuNode> {
        let Some(path) = self.index_path(id) else {
            return Vec::new();
        };

        let mut ancestors = Vec::with_capacity(path.len().saturating_sub(1));
        let mut level = &self.roots;
        for &i in &path[..path.len() - 1] {
            let node = &level[i];
            ancestors.push(node.as_ref());
            level = &node.children;
        }
        ancestors
    }

    /// The depth-0 node whose subtree contains `id`
    pub fn root_of(&self, id: &str) -> Option<&MenuNode> {
        let path = self.index_path(id)?;
        self.roots.get(path[0]).map(Arc::as_ref)
    }

    /// Forest statistics
    pub fn stats(&self) -> ForestStats {
        let mut stats = ForestStats {
            root_nodes: self.roots.len(),
            ..ForestStats::default()
        };

        for node in self.iter() {
            stats.total_nodes += 1;
            if node.children.is_empty() {
                stats.leaf_nodes += 1;
            } else {
                stats.branch_nodes += 1;
            }
            if node.expanded {
                stats.expanded_nodes += 1;
            }
            if !node.visible {
                stats.hidden_nodes += 1;
            }
            if !node.enabled {
                stats.disabled_nodes += 1;
            }
            stats.max_depth = stats.max_depth.max(node.depth + 1);
        }

        stats
    }

    /// Check every structural invariant and describe each violation
    ///
    /// Forests produced by [`build`] and the expansion functions always return
    /// an empty list; the check exists for tests and for the CLI `validate`
    /// command.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut seen = id_set_with_capacity(64);
        let mut out = Vec::new();
        let mut pending: Vec<(&[Arc<MenuNode>], Option<&MenuNode>)> = vec![(self.roots.as_slice(), None)];

        while let Some((nodes, parent)) = pending.pop() {
            for pair in nodes.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if (a.sort_order, &a.id) > (b.sort_order, &b.id) {
                    out.push(format!("siblings {} and {} out of order", a.id, b.id));
                }
            }
            for node in nodes {
                if !seen.insert(node.id.clone()) {
                    out.push(format!("duplicate id {}", node.id));
                }
                let expected_depth = parent.map_or(0, |p| p.depth + 1);
                if node.depth != expected_depth {
                    out.push(format!("{} has depth {}, expected {}", node.id, node.depth, expected_depth));
                }
                if parent.map(|p| p.id.as_str()) != node.parent_id.as_deref() {
                    out.push(format!("{} has a parent id that does not match its position", node.id));
                }
                if !node.children.is_empty() {
                    pending.push((node.children.as_slice(), Some(node.as_ref())));
                }
            }
        }
        out
    }

    /// Render an outline for terminals
    ///
    /// Branches show `[+]`/`[-]` for collapsed/expanded, the active node is
    /// marked with `*`, and children of collapsed branches are still listed so
    /// the whole structure is visible.
    pub fn render_outline(&self, active_id: Option<&str>) -> String {
        // (node, indentation inherited from its ancestors, last among siblings)
        let mut pending: Vec<(&MenuNode, String, bool)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, root)| (root.as_ref(), String::new(), i == self.roots.len() - 1))
            .collect();

        let mut out = String::new();
        while let Some((node, prefix, is_last)) = pending.pop() {
            let connector = if is_last { "└── " } else { "├── " };
            let toggle = match (node.has_children(), node.expanded) {
                (false, _) => "",
                (true, true) => "[-] ",
                (true, false) => "[+] ",
            };
            let marker = if active_id == Some(node.id.as_str()) { "* " } else { "" };

            out.push_str(&prefix);
            out.push_str(connector);
            out.push_str(marker);
            out.push_str(toggle);
            out.push_str(&node.name);
            out.push_str(" (");
            out.push_str(&node.id);
            out.push(')');
            if !node.enabled {
                out.push_str(" [disabled]");
            }
            if !node.visible {
                out.push_str(" [hidden]");
            }
            out.push('\n');

            let extension = if is_last { "    " } else { "│   " };
            let child_prefix = format!("{}{}", prefix, extension);
            let last = node.children.len().saturating_sub(1);
            for (i, child) in node.children.iter().enumerate().rev() {
                pending.push((child.as_ref(), child_prefix.clone(), i == last));
            }
        }
        out
    }
}

/// Forest statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForestStats {
    /// Total number of nodes
    pub total_nodes: usize,
    /// Number of depth-0 nodes
    pub root_nodes: usize,
    /// Nodes without children
    pub leaf_nodes: usize,
    /// Nodes with at least one child
    pub branch_nodes: usize,
    /// Number of levels (0 for an empty forest)
    pub max_depth: u32,
    /// Nodes currently expanded
    pub expanded_nodes: usize,
    /// Nodes flagged not visible
    pub hidden_nodes: usize,
    /// Nodes flagged not enabled
    pub disabled_nodes: usize,
}
