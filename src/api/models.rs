//! Wire types for the backend REST API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Item, ItemType, PendingOperation, Workspace};

/// `GET /workspaces/sync-files`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncFilesResponse {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub files: Vec<Item>,
}

/// `POST /workspaces/{id}/files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub content: Option<String>,
    pub parent_id: Option<String>,
    pub order_index: i64,
}

impl NewFile {
    pub fn from_item(item: &Item) -> Self {
        Self {
            item_type: item.item_type,
            title: item.title.clone(),
            content: item.content.clone(),
            parent_id: item.parent_id.clone(),
            order_index: item.order_index,
        }
    }
}

/// `PATCH /files/{id}` body for a move; `parentId: null` moves to the root
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch<'a> {
    pub parent_id: Option<&'a str>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSyncRequest<'a> {
    pub operations: &'a [PendingOperation],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /workspaces/sync`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSyncResponse {
    #[serde(default)]
    pub results: Vec<OperationResult>,
    /// Temporary client id -> server id
    #[serde(default)]
    pub temp_id_map: HashMap<String, String>,
}

impl BatchSyncResponse {
    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// `GET /progress/workspaces/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceProgress {
    pub total_items: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
}

impl WorkspaceProgress {
    pub fn percent(&self) -> u8 {
        if self.total_tasks == 0 {
            return 0;
        }
        ((self.completed_tasks.min(self.total_tasks) * 100) / self.total_tasks) as u8
    }
}

/// `POST /ai/generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGenerateRequest {
    pub topic: String,
    pub workspace_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiGenerateResponse {
    /// Assistant reply shown in the chat transcript
    pub response: String,
    /// Suggested structure, passed through untouched
    pub structure: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWorkspace<'a> {
    pub name: &'a str,
}
