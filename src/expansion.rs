//! Expand/collapse state transitions
//!
//! Every function here is pure: it borrows a [`Forest`] and returns a new one.
//! Only the nodes whose flag changes, plus their ancestors, are reallocated;
//! every other subtree is shared with the input through its `Arc`.
//!
//! The layout policy is chosen by the caller, not stored anywhere:
//!
//! | Policy | Function |
//! |---|---|
//! | Accordion (independent branches) | [`toggle_expand`] |
//! | Exclusive top level | [`toggle_top_level_expand`] |
//! | Expand / collapse everything | [`expand_all`] |
//!
//! [`collect_expanded_ids`] and [`restore_expansion`] move the expansion
//! state in and out of its persisted projection.
//!
//! ```rust
//! use navtree::{expansion, tree};
//! use navtree::types::MenuRecord;
//!
//! let forest = tree::build(&[
//!     MenuRecord::new("X", "Sales"),
//!     MenuRecord::new("Y", "Stock").with_sort_order(1),
//! ])?.forest;
//!
//! let forest = expansion::toggle_top_level_expand(&forest, "X");
//! let forest = expansion::toggle_top_level_expand(&forest, "Y");
//! assert_eq!(expansion::collect_expanded_ids(&forest).as_slice(), ["Y"]);
//! # Ok::<(), navtree::ValidationError>(())
//! ```

use crate::collections::id_set_from;
use crate::types::{ExpandedIds, Forest, MenuNode};
use std::sync::Arc;
use tracing::trace;

/// Flip `expanded` on the node with `id`, leaving every other node alone
///
/// Unknown ids return a forest equal to the input.
pub fn toggle_expand(forest: &Forest, id: &str) -> Forest {
    match forest.index_path(id) {
        Some(path) => Forest::from_roots(update_at(&forest.roots, &path, &flip)),
        None => {
            trace!("toggle_expand: {} not in forest", id);
            forest.clone()
        }
    }
}

/// Exclusive top-level toggle
///
/// Every root other than the one containing `id` is collapsed, then `id`
/// itself is toggled. Calling it again on an expanded root closes that root
/// without opening another one. Flags below depth 0 are left as they are. For
/// an unknown id the first expanded root is kept and the others collapsed, so
/// at most one root is expanded afterwards in every case.
pub fn toggle_top_level_expand(forest: &Forest, id: &str) -> Forest {
    let path = forest.index_path(id);
    let keep = match &path {
        Some(path) => Some(path[0]),
        None => forest.roots.iter().position(|root| root.expanded),
    };

    let roots: Vec<_> = forest
        .roots
        .iter()
        .enumerate()
        .map(|(i, root)| {
            if Some(i) != keep && root.expanded {
                Arc::new(root.with_expanded(false))
            } else {
                Arc::clone(root)
            }
        })
        .collect();

    match path {
        Some(path) => Forest::from_roots(update_at(&roots, &path, &flip)),
        None => {
            trace!("toggle_top_level_expand: {} not in forest", id);
            Forest::from_roots(roots)
        }
    }
}

/// Set every node, at every depth, to `expand`
pub fn expand_all(forest: &Forest, expand: bool) -> Forest {
    Forest::from_roots(remap_all(&forest.roots, &|_| expand))
}

/// Expand exactly the nodes whose id is in `ids`
///
/// Ids that are not in the forest are ignored, so a set captured before the
/// data changed can be applied safely. Nodes not listed end up collapsed.
pub fn restore_expansion(forest: &Forest, ids: &ExpandedIds) -> Forest {
    let wanted = id_set_from(ids.iter());
    Forest::from_roots(remap_all(&forest.roots, &|node| wanted.contains(node.id.as_str())))
}

/// Ids of all expanded nodes, in pre-order
pub fn collect_expanded_ids(forest: &Forest) -> ExpandedIds {
    forest
        .iter()
        .filter(|node| node.expanded)
        .map(|node| node.id.clone())
        .collect()
}

fn flip(node: &MenuNode) -> MenuNode {
    node.with_expanded(!node.expanded)
}

/// Copy the nodes along `path` and replace the last one with `f(node)`
fn update_at(
    nodes: &[Arc<MenuNode>],
    path: &[usize],
    f: &impl Fn(&MenuNode) -> MenuNode,
) -> Vec<Arc<MenuNode>> {
    let Some((&target, ancestors)) = path.split_last() else {
        return nodes.to_vec();
    };

    // Sibling lists along the path, outermost first
    let mut levels = Vec::with_capacity(path.len());
    let mut level = nodes;
    levels.push(level);
    for &i in ancestors {
        level = level[i].children.as_slice();
        levels.push(level);
    }

    let mut siblings = level.to_vec();
    siblings[target] = Arc::new(f(level[target].as_ref()));

    // Rebuild each ancestor around the new sibling list, innermost first
    for (level, &i) in levels.iter().zip(ancestors).rev() {
        let mut copy = MenuNode::clone(&level[i]);
        copy.children = siblings;
        siblings = level.to_vec();
        siblings[i] = Arc::new(copy);
    }
    siblings
}

/// A node whose children are being recomputed
struct Frame<'a> {
    node: &'a Arc<MenuNode>,
    children: Vec<Arc<MenuNode>>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a Arc<MenuNode>) -> Self {
        Self {
            node,
            children: Vec::with_capacity(node.children.len()),
        }
    }
}

/// Recompute `expanded` for every node, reusing subtrees that come out equal
///
/// Post-order over an explicit stack: a node is finished once all of its
/// children are.
fn remap_all(nodes: &[Arc<MenuNode>], decide: &impl Fn(&MenuNode) -> bool) -> Vec<Arc<MenuNode>> {
    let mut out = Vec::with_capacity(nodes.len());

    for root in nodes {
        let mut stack = vec![Frame::new(root)];
        while let Some(top) = stack.last() {
            let node = top.node;
            if let Some(child) = node.children.get(top.children.len()) {
                stack.push(Frame::new(child));
                continue;
            }

            let Some(Frame { node, children }) = stack.pop() else { break };
            let done = remap(node, children, decide);
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => out.push(done),
            }
        }
    }
    out
}

fn remap(
    node: &Arc<MenuNode>,
    children: Vec<Arc<MenuNode>>,
    decide: &impl Fn(&MenuNode) -> bool,
) -> Arc<MenuNode> {
    let expanded = decide(node);

    let children_shared = children
        .iter()
        .zip(&node.children)
        .all(|(new, old)| Arc::ptr_eq(new, old));
    if children_shared && expanded == node.expanded {
        return Arc::clone(node);
    }

    let mut copy = node.with_expanded(expanded);
    copy.children = children;
    Arc::new(copy)
}
