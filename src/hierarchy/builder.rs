//! Hierarchy Builder
//!
//! Turns a flat item list into a nested tree and back.

use std::collections::{HashMap, HashSet};

use crate::domain::Item;

/// An item with its derived children
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub item: Item,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(item: Item) -> Self {
        Self { item, children: Vec::new() }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}

/// Build a tree from a flat list.
///
/// Roots are items without a parent or whose parent is not in the input.
/// Siblings are ordered by `order_index`, ties keep input order.
/// Items caught in a parent cycle are unreachable from any root and dropped.
pub fn build_hierarchy(items: &[Item]) -> Vec<TreeNode> {
    let present: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();

    // Build parent -> children map, preserving input order
    let mut children_map: HashMap<Option<&str>, Vec<&Item>> = HashMap::new();
    for item in items {
        let parent = item
            .parent_id
            .as_deref()
            .filter(|pid| present.contains(pid) && *pid != item.id);
        children_map.entry(parent).or_default().push(item);
    }

    // Stable sort: equal indices stay in input order
    for children in children_map.values_mut() {
        children.sort_by_key(|i| i.order_index);
    }

    fn collect<'a>(
        parent_id: Option<&'a str>,
        children_map: &HashMap<Option<&'a str>, Vec<&'a Item>>,
        visited: &mut HashSet<String>,
    ) -> Vec<TreeNode> {
        let Some(children) = children_map.get(&parent_id) else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(children.len());
        for item in children {
            if !visited.insert(item.id.clone()) {
                continue;
            }
            nodes.push(TreeNode {
                item: (*item).clone(),
                children: collect(Some(item.id.as_str()), children_map, visited),
            });
        }
        nodes
    }

    let mut visited = HashSet::new();
    collect(None, &children_map, &mut visited)
}

/// Build the navigation tree: trashed items are left out
pub fn build_active_hierarchy(items: &[Item]) -> Vec<TreeNode> {
    let active: Vec<Item> = items.iter().filter(|i| i.active).cloned().collect();
    build_hierarchy(&active)
}

/// Walk a tree depth-first, recording parent and sibling position.
pub fn flatten_tree(nodes: &[TreeNode]) -> Vec<Item> {
    fn walk(nodes: &[TreeNode], parent_id: Option<&str>, out: &mut Vec<Item>) {
        for (index, node) in nodes.iter().enumerate() {
            let mut item = node.item.clone();
            item.parent_id = parent_id.map(str::to_string);
            item.order_index = index as i64;
            out.push(item);
            walk(&node.children, Some(node.id()), out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, None, &mut out);
    out
}

/// Display rows as (item, depth) in DFS order; children of collapsed ids are hidden
pub fn visible_rows(nodes: &[TreeNode], collapsed: &HashSet<String>) -> Vec<(Item, usize)> {
    fn collect(
        nodes: &[TreeNode],
        depth: usize,
        collapsed: &HashSet<String>,
        result: &mut Vec<(Item, usize)>,
    ) {
        for node in nodes {
            result.push((node.item.clone(), depth));
            if !collapsed.contains(node.id()) {
                collect(&node.children, depth + 1, collapsed, result);
            }
        }
    }

    let mut result = Vec::new();
    collect(nodes, 0, collapsed, &mut result);
    result
}
