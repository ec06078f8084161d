//! Reorder Calculator
//!
//! Computes the result of dropping one item relative to another: the new tree
//! and the minimal list of position updates to persist.
//!
//! Sibling lists touched by a move are renumbered 0..n in display order.
//! The insertion index is looked up after the dragged item has been detached,
//! so moving an item down within its own list needs no index correction.

use std::collections::HashMap;

use tree_dragdrop::DropPosition;

use crate::domain::OrderUpdate;
use super::builder::TreeNode;
use super::locator::{find_by_id, find_path, is_descendant};

/// Outcome of a valid move
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    /// Items whose parent or index changed, old sibling list first
    pub updates: Vec<OrderUpdate>,
    /// Tree after the move
    pub tree: Vec<TreeNode>,
}

impl ReorderPlan {
    /// Dropped back where it already was
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Plan a move of `dragged_id` relative to `target_id`.
///
/// Returns `None` when the move is not allowed: same item, unknown ids,
/// `Inside` on a non-container, or a target inside the dragged subtree.
pub fn calculate_reorder(
    tree: &[TreeNode],
    dragged_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Option<ReorderPlan> {
    if dragged_id == target_id {
        return None;
    }
    let dragged = find_by_id(tree, dragged_id)?;
    let target = find_by_id(tree, target_id)?;

    if position == DropPosition::Inside && !target.item.item_type.is_container() {
        return None;
    }
    // Would make the item its own ancestor
    if is_descendant(dragged, target_id) {
        return None;
    }

    let old_parent = structural_parent(tree, dragged_id)?;
    let new_parent = match position {
        DropPosition::Inside => Some(target_id.to_string()),
        DropPosition::Before | DropPosition::After => structural_parent(tree, target_id)?,
    };

    let before = positions(tree);

    let mut next = tree.to_vec();
    let mut moving = detach(&mut next, dragged_id)?;
    moving.item.parent_id = new_parent.clone();

    {
        let siblings = children_of_mut(&mut next, new_parent.as_deref())?;
        let insert_at = match position {
            DropPosition::Inside => siblings.len(),
            DropPosition::Before | DropPosition::After => {
                // Index in the list as it is after the removal
                let target_index = siblings.iter().position(|n| n.id() == target_id)?;
                if position == DropPosition::Before {
                    target_index
                } else {
                    target_index + 1
                }
            }
        };
        siblings.insert(insert_at, moving);
    }

    let mut touched = vec![old_parent];
    if !touched.contains(&new_parent) {
        touched.push(new_parent);
    }

    let mut updates = Vec::new();
    for parent in &touched {
        let Some(siblings) = children_of_mut(&mut next, parent.as_deref()) else {
            continue;
        };
        for (index, node) in siblings.iter_mut().enumerate() {
            node.item.order_index = index as i64;
            let now = (node.item.parent_id.clone(), node.item.order_index);
            if before.get(node.id()) != Some(&now) {
                updates.push(OrderUpdate {
                    id: node.item.id.clone(),
                    order_index: now.1,
                    parent_id: now.0,
                });
            }
        }
    }

    Some(ReorderPlan { updates, tree: next })
}

/// Parent in the tree structure (None = root list)
fn structural_parent(tree: &[TreeNode], id: &str) -> Option<Option<String>> {
    find_path(tree, id).map(|path| path.ancestor_ids.last().cloned())
}

/// Stored (parent_id, order_index) per id
fn positions(tree: &[TreeNode]) -> HashMap<String, (Option<String>, i64)> {
    fn walk(nodes: &[TreeNode], out: &mut HashMap<String, (Option<String>, i64)>) {
        for node in nodes {
            out.insert(
                node.item.id.clone(),
                (node.item.parent_id.clone(), node.item.order_index),
            );
            walk(&node.children, out);
        }
    }

    let mut out = HashMap::new();
    walk(tree, &mut out);
    out
}

fn detach(nodes: &mut Vec<TreeNode>, id: &str) -> Option<TreeNode> {
    if let Some(index) = nodes.iter().position(|n| n.id() == id) {
        return Some(nodes.remove(index));
    }
    for node in nodes.iter_mut() {
        if let Some(found) = detach(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_by_id_mut<'a>(nodes: &'a mut [TreeNode], id: &str) -> Option<&'a mut TreeNode> {
    for node in nodes.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_by_id_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn children_of_mut<'a>(
    nodes: &'a mut Vec<TreeNode>,
    parent_id: Option<&str>,
) -> Option<&'a mut Vec<TreeNode>> {
    match parent_id {
        None => Some(nodes),
        Some(pid) => find_by_id_mut(nodes, pid).map(|node| &mut node.children),
    }
}
