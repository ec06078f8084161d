//! Optimistic Update Applier
//!
//! Applies reorder results to the store before the backend confirms them.
//! Only `parent_id` and `order_index` are ever touched.

use std::collections::HashMap;

use crate::domain::OrderUpdate;
use super::{ClientStore, StoreEvent};

/// Rewrite positions of the listed items. Items at any depth are addressed by
/// id, so unrelated branches are left alone. Applying the same updates twice
/// is the same as applying them once.
///
/// Returns how many items actually changed.
pub fn apply_optimistic_update(store: &ClientStore, updates: &[OrderUpdate]) -> usize {
    if updates.is_empty() {
        return 0;
    }

    let changed = {
        let mut state = store.write();
        let index: HashMap<String, usize> = state
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.id.clone(), pos))
            .collect();

        let mut changed = 0;
        for update in updates {
            let Some(&pos) = index.get(&update.id) else {
                log::debug!("optimistic update skipped unknown item {}", update.id);
                continue;
            };
            let item = &mut state.items[pos];
            if item.parent_id != update.parent_id || item.order_index != update.order_index {
                item.parent_id = update.parent_id.clone();
                item.order_index = update.order_index;
                changed += 1;
            }
        }
        changed
    };

    if changed > 0 {
        store.emit(StoreEvent::ItemsChanged);
    }
    changed
}

/// Current positions of the given items, in the same shape as updates
pub fn snapshot_positions(store: &ClientStore, ids: &[String]) -> Vec<OrderUpdate> {
    let state = store.read();
    ids.iter()
        .filter_map(|id| state.items.iter().find(|i| &i.id == id))
        .map(|item| OrderUpdate {
            id: item.id.clone(),
            order_index: item.order_index,
            parent_id: item.parent_id.clone(),
        })
        .collect()
}

/// Put back positions captured with [`snapshot_positions`]
pub fn restore_positions(store: &ClientStore, snapshot: &[OrderUpdate]) -> usize {
    apply_optimistic_update(store, snapshot)
}
