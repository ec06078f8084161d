//! Client State Store
//!
//! The single authoritative in-memory copy of workspaces and items.
//! Readers get clones; every mutation goes through a store method and is
//! announced to subscribers.
//!
//! Items live in a flat list keyed by id; trees are derived on read with the
//! hierarchy builder.

mod optimistic;

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::domain::{upsert, Item, Workspace};
use crate::hierarchy::{build_active_hierarchy, TreeNode};

pub use optimistic::{apply_optimistic_update, restore_positions, snapshot_positions};

const EVENT_CAPACITY: usize = 256;

/// Store contents
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// All workspaces
    pub workspaces: Vec<Workspace>,
    /// Items of every workspace, in load order
    pub items: Vec<Item>,
    /// Current workspace ID
    pub current_workspace_id: Option<String>,
    /// Rows whose children are hidden in the tree view
    pub collapsed: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ItemsChanged,
    WorkspacesChanged,
    CurrentWorkspaceChanged(Option<String>),
    /// A row was expanded or collapsed
    CollapsedChanged { id: String, collapsed: bool },
    Notification(Notification),
}

pub struct ClientStore {
    state: RwLock<AppState>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ClientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(AppState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ========================
    // Getters
    // ========================

    pub fn snapshot(&self) -> AppState {
        self.read().clone()
    }

    pub fn items(&self) -> Vec<Item> {
        self.read().items.clone()
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        self.read().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn workspace_items(&self, workspace_id: &str) -> Vec<Item> {
        self.read()
            .items
            .iter()
            .filter(|i| i.workspace_id == workspace_id)
            .cloned()
            .collect()
    }

    /// Navigation tree of a workspace (active items only)
    pub fn workspace_tree(&self, workspace_id: &str) -> Vec<TreeNode> {
        build_active_hierarchy(&self.workspace_items(workspace_id))
    }

    /// Soft-deleted items of a workspace
    pub fn trash(&self, workspace_id: &str) -> Vec<Item> {
        self.read()
            .items
            .iter()
            .filter(|i| i.workspace_id == workspace_id && !i.active)
            .cloned()
            .collect()
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.read().workspaces.clone()
    }

    pub fn current_workspace_id(&self) -> Option<String> {
        self.read().current_workspace_id.clone()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.read().collapsed.contains(id)
    }

    pub fn collapsed(&self) -> HashSet<String> {
        self.read().collapsed.clone()
    }

    // ========================
    // Setters
    // ========================

    /// Replace everything with a fresh server snapshot
    pub fn load(&self, workspaces: Vec<Workspace>, items: Vec<Item>) {
        {
            let mut state = self.write();
            let keep_current = state
                .current_workspace_id
                .as_ref()
                .is_some_and(|id| workspaces.iter().any(|w| &w.id == id));
            if !keep_current {
                state.current_workspace_id = workspaces.first().map(|w| w.id.clone());
            }
            state.workspaces = workspaces;
            state.items = items;
        }
        self.emit(StoreEvent::WorkspacesChanged);
        self.emit(StoreEvent::ItemsChanged);
    }

    pub fn set_items(&self, items: Vec<Item>) {
        self.write().items = items;
        self.emit(StoreEvent::ItemsChanged);
    }

    pub fn upsert_item(&self, item: Item) {
        upsert(&mut self.write().items, item);
        self.emit(StoreEvent::ItemsChanged);
    }

    /// Mutate one item in place; returns the updated copy
    pub fn update_item<F>(&self, id: &str, change: F) -> Option<Item>
    where
        F: FnOnce(&mut Item),
    {
        let updated = {
            let mut state = self.write();
            let item = state.items.iter_mut().find(|i| i.id == id)?;
            change(item);
            item.clone()
        };
        self.emit(StoreEvent::ItemsChanged);
        Some(updated)
    }

    /// Remove items by id; returns how many were removed
    pub fn remove_items(&self, ids: &[String]) -> usize {
        let removed = {
            let mut state = self.write();
            let before = state.items.len();
            state.items.retain(|item| !ids.contains(&item.id));
            state.collapsed.retain(|id| !ids.contains(id));
            before - state.items.len()
        };
        if removed > 0 {
            self.emit(StoreEvent::ItemsChanged);
        }
        removed
    }

    pub fn remove_item(&self, id: &str) -> bool {
        self.remove_items(&[id.to_string()]) > 0
    }

    /// Swap a temporary id for the server id, including child references
    pub fn replace_id(&self, temp_id: &str, server_id: &str) -> bool {
        let replaced = {
            let mut state = self.write();
            let mut replaced = false;
            for item in state.items.iter_mut() {
                if item.id == temp_id {
                    item.id = server_id.to_string();
                    replaced = true;
                }
                if item.parent_id.as_deref() == Some(temp_id) {
                    item.parent_id = Some(server_id.to_string());
                }
            }
            if state.collapsed.remove(temp_id) {
                state.collapsed.insert(server_id.to_string());
            }
            replaced
        };
        if replaced {
            self.emit(StoreEvent::ItemsChanged);
        }
        replaced
    }

    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        self.write().workspaces = workspaces;
        self.emit(StoreEvent::WorkspacesChanged);
    }

    pub fn add_workspace(&self, workspace: Workspace) {
        upsert(&mut self.write().workspaces, workspace);
        self.emit(StoreEvent::WorkspacesChanged);
    }

    pub fn set_current_workspace(&self, workspace_id: Option<String>) {
        self.write().current_workspace_id = workspace_id.clone();
        self.emit(StoreEvent::CurrentWorkspaceChanged(workspace_id));
    }

    /// Flip a row's collapsed state; returns the new state
    pub fn toggle_collapsed(&self, id: &str) -> bool {
        let collapsed = {
            let mut state = self.write();
            if state.collapsed.remove(id) {
                false
            } else {
                state.collapsed.insert(id.to_string());
                true
            }
        };
        self.emit(StoreEvent::CollapsedChanged { id: id.to_string(), collapsed });
        collapsed
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let notification = Notification { level, message: message.into() };
        match level {
            NoticeLevel::Error => log::warn!("notify: {}", notification.message),
            NoticeLevel::Info | NoticeLevel::Success => log::info!("notify: {}", notification.message),
        }
        self.emit(StoreEvent::Notification(notification));
    }
}
