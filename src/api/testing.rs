//! In-process backend for tests
//!
//! Records every call and answers from an in-memory copy of the data.
//! Individual calls can be made to fail or stall.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{FileChanges, Item, ItemType, OperationKind, OrderUpdate, PendingOperation, Workspace};
use super::error::{ApiError, ApiResult};
use super::models::{
    AiGenerateRequest, AiGenerateResponse, BatchSyncResponse, NewFile, OperationResult,
    SyncFilesResponse, WorkspaceProgress,
};
use super::traits::RemoteApi;

#[derive(Default)]
struct FakeState {
    workspaces: Vec<Workspace>,
    files: Vec<Item>,
    next_id: u32,
    offline: bool,
    delay: Option<Duration>,
    failing_orders: HashSet<String>,
    failing_ops: HashSet<String>,
    fail_creates: bool,
    batch_status: Option<u16>,
    ai_reply: String,
    sync_calls: usize,
    order_calls: Vec<OrderUpdate>,
    update_calls: Vec<(String, FileChanges)>,
    created: Vec<(String, NewFile)>,
    deleted: Vec<String>,
    restored: Vec<String>,
    batches: Vec<Vec<PendingOperation>>,
    ai_requests: Vec<AiGenerateRequest>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(workspaces: Vec<Workspace>, files: Vec<Item>) -> Self {
        let api = Self::new();
        {
            let mut state = api.lock();
            state.workspaces = workspaces;
            state.files = files;
        }
        api
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Common prologue: optional stall, then fail if offline
    async fn enter(&self) -> ApiResult<()> {
        let (delay, offline) = {
            let state = self.lock();
            (state.delay, state.offline)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if offline {
            return Err(ApiError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn next_server_id(state: &mut FakeState) -> String {
        state.next_id += 1;
        format!("srv-{}", state.next_id)
    }

    // ========================
    // Knobs
    // ========================

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn fail_order_update(&self, id: &str) {
        self.lock().failing_orders.insert(id.to_string());
    }

    /// Report this queued operation as failed inside a successful batch
    pub fn fail_operation(&self, op_id: &str) {
        self.lock().failing_ops.insert(op_id.to_string());
    }

    pub fn fail_creates(&self) {
        self.lock().fail_creates = true;
    }

    /// Make the whole batch request answer with this HTTP status
    pub fn fail_batches_with(&self, status: u16) {
        self.lock().batch_status = Some(status);
    }

    pub fn set_ai_reply(&self, reply: &str) {
        self.lock().ai_reply = reply.to_string();
    }

    /// Server ids are handed out as `srv-1`, `srv-2`, ... starting after `n`
    pub fn set_next_id(&self, n: u32) {
        self.lock().next_id = n;
    }

    // ========================
    // Recorded calls
    // ========================

    pub fn sync_calls(&self) -> usize {
        self.lock().sync_calls
    }

    pub fn order_calls(&self) -> Vec<OrderUpdate> {
        self.lock().order_calls.clone()
    }

    pub fn update_calls(&self) -> Vec<(String, FileChanges)> {
        self.lock().update_calls.clone()
    }

    pub fn created(&self) -> Vec<(String, NewFile)> {
        self.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn restored(&self) -> Vec<String> {
        self.lock().restored.clone()
    }

    pub fn batches(&self) -> Vec<Vec<PendingOperation>> {
        self.lock().batches.clone()
    }

    pub fn ai_requests(&self) -> Vec<AiGenerateRequest> {
        self.lock().ai_requests.clone()
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn sync_files(&self) -> ApiResult<SyncFilesResponse> {
        self.enter().await?;
        let mut state = self.lock();
        state.sync_calls += 1;
        Ok(SyncFilesResponse {
            workspaces: state.workspaces.clone(),
            files: state.files.clone(),
        })
    }

    async fn create_workspace(&self, name: &str) -> ApiResult<Workspace> {
        self.enter().await?;
        let mut state = self.lock();
        let workspace = Workspace::new(Self::next_server_id(&mut state), name);
        state.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn create_file(&self, workspace_id: &str, file: &NewFile) -> ApiResult<Item> {
        self.enter().await?;
        let mut state = self.lock();
        state.created.push((workspace_id.to_string(), file.clone()));
        if state.fail_creates {
            return Err(ApiError::Status { status: 500, message: "create failed".into() });
        }
        let mut item = Item::new(Self::next_server_id(&mut state), workspace_id, file.item_type, &file.title)
            .under(file.parent_id.as_deref(), file.order_index);
        item.content = file.content.clone();
        state.files.push(item.clone());
        Ok(item)
    }

    async fn update_file(&self, id: &str, changes: &FileChanges) -> ApiResult<()> {
        self.enter().await?;
        let mut state = self.lock();
        state.update_calls.push((id.to_string(), changes.clone()));
        if let Some(file) = state.files.iter_mut().find(|f| f.id == id) {
            if let Some(title) = &changes.title {
                file.title = title.clone();
            }
            if let Some(content) = &changes.content {
                file.content = Some(content.clone());
            }
            if let Some(active) = changes.active {
                file.active = active;
            }
        }
        Ok(())
    }

    async fn update_order(&self, update: &OrderUpdate) -> ApiResult<()> {
        self.enter().await?;
        let mut state = self.lock();
        state.order_calls.push(update.clone());
        if state.failing_orders.contains(&update.id) {
            return Err(ApiError::Status { status: 500, message: format!("cannot move {}", update.id) });
        }
        if let Some(file) = state.files.iter_mut().find(|f| f.id == update.id) {
            file.parent_id = update.parent_id.clone();
            file.order_index = update.order_index;
        }
        Ok(())
    }

    async fn delete_file(&self, id: &str) -> ApiResult<()> {
        self.enter().await?;
        let mut state = self.lock();
        state.deleted.push(id.to_string());
        state.files.retain(|f| f.id != id);
        Ok(())
    }

    async fn restore_file(&self, id: &str) -> ApiResult<()> {
        self.enter().await?;
        let mut state = self.lock();
        state.restored.push(id.to_string());
        if let Some(file) = state.files.iter_mut().find(|f| f.id == id) {
            file.active = true;
        }
        Ok(())
    }

    async fn batch_sync(&self, operations: &[PendingOperation]) -> ApiResult<BatchSyncResponse> {
        self.enter().await?;
        let mut state = self.lock();
        state.batches.push(operations.to_vec());
        if let Some(status) = state.batch_status {
            return Err(ApiError::Status { status, message: "batch rejected".into() });
        }

        let mut temp_id_map: HashMap<String, String> = HashMap::new();
        let mut results = Vec::new();
        for op in operations {
            let success = !state.failing_ops.contains(&op.id);
            if success {
                let resolve = |id: &str| temp_id_map.get(id).cloned().unwrap_or_else(|| id.to_string());
                match &op.kind {
                    OperationKind::Create { temp_id, workspace_id, item_type, title, content, parent_id, order_index } => {
                        let parent = parent_id.as_deref().map(resolve);
                        let server_id = Self::next_server_id(&mut state);
                        let mut item = Item::new(&server_id, workspace_id, *item_type, title)
                            .under(parent.as_deref(), *order_index);
                        item.content = content.clone();
                        state.files.push(item);
                        temp_id_map.insert(temp_id.clone(), server_id);
                    }
                    OperationKind::Update { file_id, changes } => {
                        let id = resolve(file_id);
                        if let Some(file) = state.files.iter_mut().find(|f| f.id == id) {
                            if let Some(title) = &changes.title {
                                file.title = title.clone();
                            }
                            if let Some(active) = changes.active {
                                file.active = active;
                            }
                        }
                    }
                    OperationKind::UpdateOrder { file_id, parent_id, order_index } => {
                        let id = resolve(file_id);
                        let parent = parent_id.as_deref().map(resolve);
                        if let Some(file) = state.files.iter_mut().find(|f| f.id == id) {
                            file.parent_id = parent;
                            file.order_index = *order_index;
                        }
                    }
                    OperationKind::Delete { file_id } => {
                        let id = resolve(file_id);
                        state.files.retain(|f| f.id != id);
                    }
                }
            }
            results.push(OperationResult {
                id: op.id.clone(),
                success,
                error: (!success).then(|| "rejected".to_string()),
            });
        }
        Ok(BatchSyncResponse { results, temp_id_map })
    }

    async fn workspace_progress(&self, workspace_id: &str) -> ApiResult<WorkspaceProgress> {
        self.enter().await?;
        let state = self.lock();
        let items: Vec<&Item> = state.files.iter().filter(|i| i.workspace_id == workspace_id).collect();
        let tasks: Vec<&&Item> = items.iter().filter(|i| i.item_type == ItemType::Task).collect();
        Ok(WorkspaceProgress {
            total_items: items.len() as u64,
            total_tasks: tasks.len() as u64,
            completed_tasks: 0,
        })
    }

    async fn ai_generate(&self, request: &AiGenerateRequest) -> ApiResult<AiGenerateResponse> {
        self.enter().await?;
        let mut state = self.lock();
        state.ai_requests.push(request.clone());
        Ok(AiGenerateResponse { response: state.ai_reply.clone(), structure: None })
    }
}
