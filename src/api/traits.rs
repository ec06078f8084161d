//! Remote API - Core Trait
//!
//! The backend as seen by the rest of the crate. `HttpApi` is the real
//! implementation; tests substitute an in-process fake.

use async_trait::async_trait;

use crate::domain::{FileChanges, Item, OrderUpdate, PendingOperation, Workspace};
use super::error::ApiResult;
use super::models::{
    AiGenerateRequest, AiGenerateResponse, BatchSyncResponse, NewFile, SyncFilesResponse,
    WorkspaceProgress,
};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Every workspace and item of the current user
    async fn sync_files(&self) -> ApiResult<SyncFilesResponse>;

    async fn create_workspace(&self, name: &str) -> ApiResult<Workspace>;

    /// Create an item; the returned copy carries the server id
    async fn create_file(&self, workspace_id: &str, file: &NewFile) -> ApiResult<Item>;

    async fn update_file(&self, id: &str, changes: &FileChanges) -> ApiResult<()>;

    /// Persist one position update from a reorder
    async fn update_order(&self, update: &OrderUpdate) -> ApiResult<()>;

    /// Permanent delete
    async fn delete_file(&self, id: &str) -> ApiResult<()>;

    /// Bring a soft-deleted item back
    async fn restore_file(&self, id: &str) -> ApiResult<()>;

    /// Replay queued operations in one request
    async fn batch_sync(&self, operations: &[PendingOperation]) -> ApiResult<BatchSyncResponse>;

    async fn workspace_progress(&self, workspace_id: &str) -> ApiResult<WorkspaceProgress>;

    async fn ai_generate(&self, request: &AiGenerateRequest) -> ApiResult<AiGenerateResponse>;
}
