//! Item Commands
//!
//! Create, edit, move, trash and delete items. All of them are optimistic:
//! the store changes before the backend hears about it.

use std::sync::Arc;

use crate::api::NewFile;
use crate::domain::{
    is_temp_id, new_temp_id, Checklist, DomainError, FileChanges, Item, ItemType, OperationKind,
};
use crate::hierarchy::{build_hierarchy, calculate_reorder, find_by_id, DropIntent, DropPosition, TreeNode};
use crate::search::{search, SearchHit};
use crate::store::{apply_optimistic_update, NoticeLevel};
use crate::sync::persist_reorder;
use super::{CommandResult, Organizer};

const DEFAULT_TITLE: &str = "Untitled";

/// Input for [`Organizer::create_item`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub item_type: ItemType,
    pub title: String,
    pub content: Option<String>,
    pub parent_id: Option<String>,
}

impl NewItem {
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        Self { item_type, title: title.into(), ..Default::default() }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Ids of a node and everything below it, parents before children
fn subtree_ids(node: &TreeNode) -> Vec<String> {
    let mut ids = vec![node.id().to_string()];
    for child in &node.children {
        ids.extend(subtree_ids(child));
    }
    ids
}

impl Organizer {
    fn require_item(&self, id: &str) -> CommandResult<Item> {
        self.store_ref()
            .item(id)
            .ok_or_else(|| DomainError::NotFound(format!("item {}", id)).into())
    }

    /// The item and all its descendants, trashed ones included
    fn subtree(&self, item: &Item) -> Vec<String> {
        let tree = build_hierarchy(&self.store_ref().workspace_items(&item.workspace_id));
        find_by_id(&tree, &item.id)
            .map(subtree_ids)
            .unwrap_or_else(|| vec![item.id.clone()])
    }

    // ========================
    // Create
    // ========================

    /// Add an item at the end of its sibling list in the current workspace.
    ///
    /// The item shows up immediately under a temporary id. Online, the id is
    /// swapped for the server's once the create succeeds, and the item is
    /// removed again if it fails. Offline, a CREATE is queued.
    pub async fn create_item(&self, new_item: NewItem) -> CommandResult<Item> {
        let workspace_id = self.current_workspace()?;

        if let Some(parent_id) = &new_item.parent_id {
            let parent = self.require_item(parent_id)?;
            if !parent.item_type.is_container() || parent.workspace_id != workspace_id {
                return Err(DomainError::InvalidInput(format!("{} cannot hold items", parent.title)).into());
            }
        }

        let siblings = self
            .store_ref()
            .workspace_items(&workspace_id)
            .into_iter()
            .filter(|i| i.active && i.parent_id == new_item.parent_id)
            .count();

        let title = match new_item.title.trim() {
            "" => DEFAULT_TITLE.to_string(),
            t => t.to_string(),
        };
        let mut item = Item::new(new_temp_id(), &workspace_id, new_item.item_type, title)
            .under(new_item.parent_id.as_deref(), siblings as i64);
        item.content = new_item.content;
        self.store_ref().upsert_item(item.clone());

        if !self.is_online() {
            self.queue()
                .enqueue(OperationKind::Create {
                    temp_id: item.id.clone(),
                    workspace_id: workspace_id.clone(),
                    item_type: item.item_type,
                    title: item.title.clone(),
                    content: item.content.clone(),
                    parent_id: item.parent_id.clone(),
                    order_index: item.order_index,
                })
                .await?;
            return Ok(item);
        }

        let created = match self.api().create_file(&workspace_id, &NewFile::from_item(&item)).await {
            Ok(created) => created,
            Err(e) => {
                self.store_ref().remove_item(&item.id);
                self.store_ref()
                    .notify(NoticeLevel::Error, format!("Failed to create {}: {}", item.title, e));
                return Err(e.into());
            }
        };

        if !self.store_ref().replace_id(&item.id, &created.id) {
            // Deleted while the request was out; the server copy has to go too
            log::info!("Created {} as {} after it was deleted, removing", item.id, created.id);
            if let Err(e) = self.api().delete_file(&created.id).await {
                log::warn!("Delete of {} failed, queueing: {}", created.id, e);
                self.queue()
                    .enqueue(OperationKind::Delete { file_id: created.id.clone() })
                    .await?;
            }
            return Ok(created);
        }

        // Local edits made in the meantime win over the server copy
        let stored = self
            .store_ref()
            .update_item(&created.id, |stored| {
                stored.created_at = created.created_at.clone();
                stored.updated_at = created.updated_at.clone();
            })
            .unwrap_or(created);
        log::info!("Created {} as {}", item.id, stored.id);

        // Those edits were queued under the temp id
        let id_map = [(item.id.clone(), stored.id.clone())].into_iter().collect();
        let remapped = self.queue().remap_temp_ids(&id_map).await?;
        if remapped > 0 && self.is_online() {
            if let Err(e) = self.flush_pending().await {
                log::warn!("Sending edits of {} failed: {}", stored.id, e);
            }
        }
        Ok(stored)
    }

    // ========================
    // Edit
    // ========================

    pub async fn rename_item(&self, id: &str, title: &str) -> CommandResult<Item> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("title is empty".to_string()).into());
        }
        let updated = self
            .store_ref()
            .update_item(id, |item| item.title = title.to_string())
            .ok_or_else(|| DomainError::NotFound(format!("item {}", id)))?;

        let changes = FileChanges { title: Some(title.to_string()), ..Default::default() };
        self.backend.save_changes(id, changes).await?;
        Ok(updated)
    }

    /// Store the new content now; persist once edits pause for the save window
    pub fn update_content(&self, id: &str, content: String) -> CommandResult<Item> {
        let updated = self
            .store_ref()
            .update_item(id, |item| item.content = Some(content.clone()))
            .ok_or_else(|| DomainError::NotFound(format!("item {}", id)))?;

        let backend = self.backend.clone();
        let file_id = id.to_string();
        let save = async move {
            let changes = FileChanges { content: Some(content), ..Default::default() };
            if let Err(e) = backend.save_changes(&file_id, changes).await {
                log::warn!("Debounced save of {} failed: {}", file_id, e);
            }
        };

        self.saves.call(id, save);
        Ok(updated)
    }

    /// Add a line to a task's checklist
    pub async fn add_task_entry(&self, id: &str, text: &str) -> CommandResult<Checklist> {
        self.edit_checklist(id, |list| {
            list.push(text.trim());
            true
        })
        .await
    }

    /// Flip one checklist entry of a task
    pub async fn toggle_task_entry(&self, id: &str, index: usize) -> CommandResult<Checklist> {
        self.edit_checklist(id, |list| list.toggle(index).is_some()).await
    }

    async fn edit_checklist<F>(&self, id: &str, edit: F) -> CommandResult<Checklist>
    where
        F: FnOnce(&mut Checklist) -> bool,
    {
        let item = self.require_item(id)?;
        if item.item_type != ItemType::Task {
            return Err(DomainError::InvalidInput(format!("{} is not a task", item.title)).into());
        }
        let mut list = Checklist::parse(item.content.as_deref())?;
        if !edit(&mut list) {
            return Err(DomainError::InvalidInput("no such checklist entry".to_string()).into());
        }

        let content = list.to_content()?;
        self.store_ref()
            .update_item(id, |item| item.content = Some(content.clone()));
        let changes = FileChanges { content: Some(content), ..Default::default() };
        self.backend.save_changes(id, changes).await?;
        Ok(list)
    }

    // ========================
    // Move
    // ========================

    /// Drop `dragged_id` relative to `target_id`.
    ///
    /// Returns `false` when the drop is not allowed or changes nothing; the
    /// store is left alone in that case. After a partial backend failure the
    /// whole workspace is reloaded.
    pub async fn move_item(
        &self,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> CommandResult<bool> {
        let Some(dragged) = self.store_ref().item(dragged_id) else {
            return Ok(false);
        };
        let tree = self.workspace_tree(&dragged.workspace_id);
        let Some(plan) = calculate_reorder(&tree, dragged_id, target_id, position) else {
            log::debug!("Rejected move of {} {} {}", dragged_id, position.as_str(), target_id);
            return Ok(false);
        };
        if plan.is_noop() {
            return Ok(false);
        }

        apply_optimistic_update(self.store_ref(), &plan.updates);

        let offline = !self.is_online();
        if offline || plan.updates.iter().any(|u| is_temp_id(&u.id)) {
            for update in plan.updates {
                self.queue()
                    .enqueue(OperationKind::UpdateOrder {
                        file_id: update.id,
                        parent_id: update.parent_id,
                        order_index: update.order_index,
                    })
                    .await?;
            }
            return Ok(true);
        }

        let report = persist_reorder(Arc::clone(&self.backend.api), self.store_ref(), plan.updates).await;
        if report.needs_resync() {
            if let Err(e) = self.resync().await {
                log::warn!("Resync after failed move did not complete: {}", e);
            }
        }
        Ok(true)
    }

    /// Finish a drag gesture from the tree view
    pub async fn drop_item(&self, intent: DropIntent<String>) -> CommandResult<bool> {
        self.move_item(&intent.dragged_id, &intent.target_id, intent.position).await
    }

    // ========================
    // Trash
    // ========================

    /// Soft delete; descendants go to the trash with it
    pub async fn trash_item(&self, id: &str) -> CommandResult<()> {
        self.set_active(id, false).await
    }

    /// Bring an item and its descendants back from the trash
    pub async fn restore_item(&self, id: &str) -> CommandResult<()> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &str, active: bool) -> CommandResult<()> {
        let item = self.require_item(id)?;
        let ids = self.subtree(&item);
        for member in &ids {
            self.store_ref().update_item(member, |i| i.active = active);
        }

        for member in &ids {
            if active && self.is_online() && !is_temp_id(member) {
                if let Err(e) = self.api().restore_file(member).await {
                    self.store_ref()
                        .notify(NoticeLevel::Error, format!("Failed to restore {}: {}", item.title, e));
                    return Err(e.into());
                }
            } else {
                let changes = FileChanges { active: Some(active), ..Default::default() };
                self.backend.save_changes(member, changes).await?;
            }
        }
        log::info!("{} {} items under {}", if active { "Restored" } else { "Trashed" }, ids.len(), id);
        Ok(())
    }

    /// Trashed items of the current workspace
    pub fn trash(&self) -> Vec<Item> {
        match self.store_ref().current_workspace_id() {
            Some(ws) => self.store_ref().trash(&ws),
            None => Vec::new(),
        }
    }

    /// Remove an item and its descendants for good
    pub async fn delete_permanently(&self, id: &str) -> CommandResult<usize> {
        let item = self.require_item(id)?;
        let ids = self.subtree(&item);
        for member in &ids {
            self.saves.cancel(member);
        }
        let removed = self.store_ref().remove_items(&ids);

        // Children first so a cascading backend never sees a missing row
        for member in ids.iter().rev() {
            if is_temp_id(member) {
                // Never reached the server; drop what was queued for it
                self.queue().discard_target(member).await?;
            } else if self.is_online() {
                if let Err(e) = self.api().delete_file(member).await {
                    self.store_ref()
                        .notify(NoticeLevel::Error, format!("Failed to delete {}: {}", item.title, e));
                    return Err(e.into());
                }
            } else {
                self.queue()
                    .enqueue(OperationKind::Delete { file_id: member.clone() })
                    .await?;
            }
        }
        Ok(removed)
    }

    // ========================
    // View state
    // ========================

    pub fn toggle_collapsed(&self, id: &str) -> bool {
        self.store_ref().toggle_collapsed(id)
    }

    /// Command palette over the current workspace
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        search(&self.current_tree(), query, limit)
    }
}
