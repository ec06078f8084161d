//! Hierarchy Engine
//!
//! Pure tree utilities over workspace items:
//! - builder: flat list <-> nested tree
//! - locator: depth-first lookups and the cycle guard
//! - reorder: drag-and-drop move planning
//!
//! Nothing here errors for "not found" or "not allowed"; callers get `None`
//! or an empty result and decide whether that matters.

mod builder;
mod locator;
mod reorder;

pub use builder::{build_active_hierarchy, build_hierarchy, flatten_tree, visible_rows, TreeNode};
pub use locator::{breadcrumb, find_by_id, find_path, is_descendant, ItemPath};
pub use reorder::{calculate_reorder, ReorderPlan};
pub use tree_dragdrop::{resolve_position, DragState, DropIntent, DropPosition};
