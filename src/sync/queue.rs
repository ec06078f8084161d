//! Pending Operation Queue
//!
//! Durable log of changes made while the backend was unreachable, replayed
//! in one batch request. A failed batch leaves everything queued for the next
//! attempt; a successful one removes what was sent.

use std::collections::HashMap;

use crate::api::{ApiError, OperationResult, RemoteApi};
use crate::domain::{DomainError, DomainResult, OperationKind, PendingOperation};
use crate::repository::PendingRepository;
use crate::store::{ClientStore, NoticeLevel};
use super::guard::InFlight;

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Another sync pass was already running; nothing was done
    AlreadyRunning,
    /// Nothing queued
    Empty,
    Synced(SyncReport),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub submitted: usize,
    /// Operations the backend rejected individually
    pub rejected: Vec<OperationResult>,
    pub temp_id_map: HashMap<String, String>,
}

pub struct PendingQueue {
    repo: PendingRepository,
    capacity: usize,
    in_flight: InFlight,
}

/// Order for replay: creates first so later operations can refer to them,
/// then updates, moves and deletes; oldest first within each group.
pub fn batch_order(mut ops: Vec<PendingOperation>) -> Vec<PendingOperation> {
    ops.sort_by_key(|op| (op.op_type(), op.timestamp));
    ops
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl PendingQueue {
    pub fn new(repo: PendingRepository, capacity: usize) -> Self {
        Self {
            repo,
            capacity: capacity.max(1),
            in_flight: InFlight::new(),
        }
    }

    /// Queue an operation. An operation with the same key replaces the queued
    /// one; two field updates for the same key are merged.
    pub async fn enqueue(&self, kind: OperationKind) -> DomainResult<PendingOperation> {
        self.enqueue_at(kind, now_millis()).await
    }

    async fn enqueue_at(&self, kind: OperationKind, timestamp: i64) -> DomainResult<PendingOperation> {
        let mut op = PendingOperation::new(kind, timestamp);

        if let OperationKind::Update { changes, .. } = &mut op.kind {
            if let Some(PendingOperation { kind: OperationKind::Update { changes: earlier, .. }, .. }) =
                self.repo.find(&op.id).await?
            {
                let mut merged = earlier;
                merged.merge(std::mem::take(changes));
                *changes = merged;
            }
        }

        self.repo.upsert(&op).await?;
        log::debug!("Queued {} ({})", op.id, op.op_type().as_str());

        let dropped = self.repo.trim_to(self.capacity).await?;
        if !dropped.is_empty() {
            log::warn!(
                "Pending queue over capacity {}, dropped {} oldest: {:?}",
                self.capacity,
                dropped.len(),
                dropped
            );
        }
        Ok(op)
    }

    pub async fn pending(&self) -> DomainResult<Vec<PendingOperation>> {
        self.repo.list().await
    }

    pub async fn len(&self) -> DomainResult<usize> {
        self.repo.count().await
    }

    pub async fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len().await? == 0)
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.is_running()
    }

    /// Point queued operations at server ids. Returns how many changed.
    pub async fn remap_temp_ids(&self, id_map: &HashMap<String, String>) -> DomainResult<usize> {
        if id_map.is_empty() {
            return Ok(0);
        }
        let mut changed = 0;
        for mut op in self.repo.list().await? {
            if op.kind.remap_ids(id_map) {
                self.repo.update(&op).await?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Forget every queued operation acting on `id`
    pub async fn discard_target(&self, id: &str) -> DomainResult<usize> {
        let keys: Vec<String> = self
            .repo
            .list()
            .await?
            .into_iter()
            .filter(|op| op.kind.target_id() == id)
            .map(|op| op.id)
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }
        self.repo.remove(&keys).await
    }

    /// Replay everything queued in one batch request.
    ///
    /// Overlapping calls do not stack: the second returns
    /// [`SyncOutcome::AlreadyRunning`] right away.
    pub async fn sync(&self, api: &dyn RemoteApi, store: &ClientStore) -> Result<SyncOutcome, SyncError> {
        let Some(_guard) = self.in_flight.try_begin() else {
            log::debug!("Sync already in progress, skipping");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let batch = batch_order(self.repo.list().await?);
        if batch.is_empty() {
            return Ok(SyncOutcome::Empty);
        }
        log::info!("Syncing {} pending operations", batch.len());

        let response = match api.batch_sync(&batch).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Batch sync failed, keeping {} operations: {}", batch.len(), e);
                store.notify(
                    NoticeLevel::Error,
                    format!("Sync failed, {} changes kept for retry: {}", batch.len(), e),
                );
                return Err(e.into());
            }
        };

        for (temp_id, server_id) in &response.temp_id_map {
            store.replace_id(temp_id, server_id);
        }

        let submitted = batch.len();
        self.repo.remove_sent(&batch).await?;
        // Anything queued while the request was out may still use temp ids
        let remapped = self.remap_temp_ids(&response.temp_id_map).await?;
        if remapped > 0 {
            log::info!("Remapped {} queued operations to server ids", remapped);
        }

        let rejected: Vec<OperationResult> = response.failures().cloned().collect();
        if !rejected.is_empty() {
            store.notify(
                NoticeLevel::Error,
                format!("{} of {} changes were rejected by the server", rejected.len(), submitted),
            );
        }

        Ok(SyncOutcome::Synced(SyncReport {
            submitted,
            rejected,
            temp_id_map: response.temp_id_map,
        }))
    }
}
