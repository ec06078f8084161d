//! Commands Layer
//!
//! Operations the UI calls. Each one updates the store first, then gets the
//! change to the backend: directly when online, through the pending queue
//! when not.

mod ai_cmd;
mod item_cmd;
mod sync_cmd;
mod workspace_cmd;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, HttpApi, RemoteApi};
use crate::config::{AppConfig, FALLBACK_USER_ID};
use crate::domain::{is_temp_id, DomainError, FileChanges, OperationKind};
use crate::repository::{init_db, ClientStateRepository, DbConn, PendingRepository};
use crate::store::{ClientStore, NoticeLevel};
use crate::sync::{Debouncer, InFlight, PendingQueue, SyncError};

pub use ai_cmd::{ChatMessage, ChatRole};
pub use item_cmd::NewItem;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<SyncError> for CommandError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::Api(e) => CommandError::Api(e),
            SyncError::Storage(e) => CommandError::Domain(e),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// The parts a background save needs; cheap to clone into a task
#[derive(Clone)]
struct Backend {
    api: Arc<dyn RemoteApi>,
    store: Arc<ClientStore>,
    queue: Arc<PendingQueue>,
    online: Arc<AtomicBool>,
}

impl Backend {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Send field changes, or queue them when offline or when the item has
    /// no server id yet
    async fn save_changes(&self, id: &str, changes: FileChanges) -> CommandResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        if !self.is_online() || is_temp_id(id) {
            self.queue
                .enqueue(OperationKind::Update { file_id: id.to_string(), changes })
                .await?;
            return Ok(());
        }
        if let Err(e) = self.api.update_file(id, &changes).await {
            self.store.notify(NoticeLevel::Error, format!("Failed to save changes: {}", e));
            return Err(e.into());
        }
        Ok(())
    }
}

/// Application facade over store, backend and offline queue
pub struct Organizer {
    backend: Backend,
    client_state: ClientStateRepository,
    resync_guard: InFlight,
    /// Content saves, keyed by item id
    saves: Debouncer,
    user_id: String,
    transcript: Mutex<Vec<ChatMessage>>,
}

impl Organizer {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        conn: DbConn,
        user_id: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        let queue = PendingQueue::new(PendingRepository::new(conn.clone()), config.queue_capacity);
        Self {
            backend: Backend {
                api,
                store: Arc::new(ClientStore::new()),
                queue: Arc::new(queue),
                online: Arc::new(AtomicBool::new(true)),
            },
            client_state: ClientStateRepository::new(conn),
            resync_guard: InFlight::new(),
            saves: Debouncer::new(config.save_debounce()),
            user_id: user_id.into(),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Open the local database and connect to the configured backend.
    /// The user id comes from persisted client state.
    pub async fn open(config: &AppConfig) -> CommandResult<Self> {
        let conn = init_db(&config.db_path())?;
        let client_state = ClientStateRepository::new(conn.clone());
        let user_id = match client_state.user_id().await? {
            Some(id) => id,
            None => {
                log::warn!("No user id stored, using {}", FALLBACK_USER_ID);
                FALLBACK_USER_ID.to_string()
            }
        };

        let api = HttpApi::new(config, user_id.clone())?;
        log::info!("Organizer ready for user {} at {}", user_id, config.api_base_url);
        Ok(Self::new(Arc::new(api), conn, user_id, config))
    }

    pub fn store(&self) -> &Arc<ClientStore> {
        &self.backend.store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn store_ref(&self) -> &ClientStore {
        &self.backend.store
    }

    fn api(&self) -> &dyn RemoteApi {
        self.backend.api.as_ref()
    }

    fn queue(&self) -> &PendingQueue {
        &self.backend.queue
    }

    fn current_workspace(&self) -> CommandResult<String> {
        self.store_ref()
            .current_workspace_id()
            .ok_or_else(|| DomainError::InvalidInput("no workspace selected".to_string()).into())
    }
}
