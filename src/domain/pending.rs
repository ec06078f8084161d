//! Pending Operations
//!
//! Locally queued intents, replayable against the backend without the UI
//! context that produced them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::ItemType;

/// One persistence update produced by a reorder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub id: String,
    pub order_index: i64,
    pub parent_id: Option<String>,
}

impl OrderUpdate {
    pub fn new(id: impl Into<String>, order_index: i64, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            order_index,
            parent_id: parent_id.map(str::to_string),
        }
    }
}

/// Partial update of an item's editable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.active.is_none()
    }

    /// Fold a later change set into this one; later values win
    pub fn merge(&mut self, later: FileChanges) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.active.is_some() {
            self.active = later.active;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationType {
    Create,
    Update,
    UpdateOrder,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "CREATE",
            OperationType::Update => "UPDATE",
            OperationType::UpdateOrder => "UPDATE_ORDER",
            OperationType::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum OperationKind {
    Create {
        temp_id: String,
        workspace_id: String,
        item_type: ItemType,
        title: String,
        content: Option<String>,
        parent_id: Option<String>,
        order_index: i64,
    },
    Update {
        file_id: String,
        changes: FileChanges,
    },
    Delete {
        file_id: String,
    },
    UpdateOrder {
        file_id: String,
        parent_id: Option<String>,
        order_index: i64,
    },
}

impl OperationKind {
    pub fn op_type(&self) -> OperationType {
        match self {
            OperationKind::Create { .. } => OperationType::Create,
            OperationKind::Update { .. } => OperationType::Update,
            OperationKind::Delete { .. } => OperationType::Delete,
            OperationKind::UpdateOrder { .. } => OperationType::UpdateOrder,
        }
    }

    /// Id of the item the operation acts on
    pub fn target_id(&self) -> &str {
        match self {
            OperationKind::Create { temp_id, .. } => temp_id,
            OperationKind::Update { file_id, .. }
            | OperationKind::Delete { file_id }
            | OperationKind::UpdateOrder { file_id, .. } => file_id,
        }
    }

    /// Rewrite references to temporary ids. Returns true if anything changed.
    pub fn remap_ids(&mut self, id_map: &HashMap<String, String>) -> bool {
        fn swap(slot: &mut String, id_map: &HashMap<String, String>) -> bool {
            match id_map.get(slot.as_str()) {
                Some(server_id) => {
                    *slot = server_id.clone();
                    true
                }
                None => false,
            }
        }
        fn swap_opt(slot: &mut Option<String>, id_map: &HashMap<String, String>) -> bool {
            slot.as_mut().map(|id| swap(id, id_map)).unwrap_or(false)
        }

        match self {
            OperationKind::Create { parent_id, .. } => swap_opt(parent_id, id_map),
            OperationKind::Update { file_id, .. } | OperationKind::Delete { file_id } => {
                swap(file_id, id_map)
            }
            OperationKind::UpdateOrder { file_id, parent_id, .. } => {
                let file = swap(file_id, id_map);
                let parent = swap_opt(parent_id, id_map);
                file || parent
            }
        }
    }
}

/// A queued operation with its ordering timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: OperationKind,
}

impl PendingOperation {
    /// CREATE keys on the temporary id so repeated creates collapse into one
    /// entry; everything else keys on type, target and timestamp.
    pub fn new(kind: OperationKind, timestamp: i64) -> Self {
        let id = match &kind {
            OperationKind::Create { temp_id, .. } => temp_id.clone(),
            other => format!("{}-{}-{}", other.op_type().as_str(), other.target_id(), timestamp),
        };
        Self { id, timestamp, kind }
    }

    pub fn op_type(&self) -> OperationType {
        self.kind.op_type()
    }
}
