//! Item Locator
//!
//! Depth-first lookups over a built tree.

use super::builder::TreeNode;

/// Where an item sits in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    /// Ancestor ids from the root down to (not including) the item
    pub ancestor_ids: Vec<String>,
    /// Position among its siblings
    pub index_among_siblings: usize,
}

pub fn find_by_id<'a>(tree: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    for node in tree {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_by_id(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_path(tree: &[TreeNode], id: &str) -> Option<ItemPath> {
    fn walk(nodes: &[TreeNode], id: &str, ancestors: &mut Vec<String>) -> Option<usize> {
        for (index, node) in nodes.iter().enumerate() {
            if node.id() == id {
                return Some(index);
            }
            ancestors.push(node.item.id.clone());
            if let Some(found) = walk(&node.children, id, ancestors) {
                return Some(found);
            }
            ancestors.pop();
        }
        None
    }

    let mut ancestor_ids = Vec::new();
    let index_among_siblings = walk(tree, id, &mut ancestor_ids)?;
    Some(ItemPath { ancestor_ids, index_among_siblings })
}

/// True if `target_id` appears anywhere below `candidate_ancestor`.
/// A node is never its own descendant.
pub fn is_descendant(candidate_ancestor: &TreeNode, target_id: &str) -> bool {
    candidate_ancestor
        .children
        .iter()
        .any(|child| child.id() == target_id || is_descendant(child, target_id))
}

/// Ancestor titles, root first
pub fn breadcrumb(tree: &[TreeNode], id: &str) -> Vec<String> {
    let Some(path) = find_path(tree, id) else {
        return Vec::new();
    };
    path.ancestor_ids
        .iter()
        .filter_map(|ancestor| find_by_id(tree, ancestor))
        .map(|node| node.item.title.clone())
        .collect()
}
