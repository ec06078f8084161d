//! Workspace Commands
//!
//! Loading server state, workspace selection and workspace-level views.

use crate::api::WorkspaceProgress;
use crate::domain::{DomainError, Item, Workspace};
use crate::hierarchy::{visible_rows, TreeNode};
use crate::store::NoticeLevel;
use super::{CommandResult, Organizer};

impl Organizer {
    /// Startup: restore the last selection, push anything queued, then pull
    /// fresh state.
    pub async fn load(&self) -> CommandResult<()> {
        if let Some(last) = self.client_state.last_workspace_id().await? {
            self.store_ref().set_current_workspace(Some(last));
        }
        if self.is_online() {
            // Failure is already surfaced; the queue keeps its contents
            if let Err(e) = self.flush_pending().await {
                log::warn!("Pending sync during load failed: {}", e);
            }
        }
        self.resync().await?;
        Ok(())
    }

    /// Replace local state with the server's. Returns `false` when another
    /// resync was already running and this call was skipped.
    pub async fn resync(&self) -> CommandResult<bool> {
        let Some(_guard) = self.resync_guard.try_begin() else {
            log::debug!("Resync already in flight");
            return Ok(false);
        };

        let snapshot = match self.api().sync_files().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.store_ref()
                    .notify(NoticeLevel::Error, format!("Failed to load workspaces: {}", e));
                return Err(e.into());
            }
        };

        // Unconfirmed local creates are not on the server yet
        let mut files = snapshot.files;
        files.extend(self.store_ref().items().into_iter().filter(Item::is_temporary));

        log::info!(
            "Loaded {} workspaces, {} items",
            snapshot.workspaces.len(),
            files.len()
        );
        self.store_ref().load(snapshot.workspaces, files);
        Ok(true)
    }

    pub async fn select_workspace(&self, workspace_id: &str) -> CommandResult<()> {
        if !self.store_ref().workspaces().iter().any(|w| w.id == workspace_id) {
            return Err(DomainError::NotFound(format!("workspace {}", workspace_id)).into());
        }
        self.store_ref().set_current_workspace(Some(workspace_id.to_string()));
        self.client_state.set_last_workspace_id(Some(workspace_id)).await?;
        Ok(())
    }

    pub async fn create_workspace(&self, name: &str) -> CommandResult<Workspace> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("workspace name is empty".to_string()).into());
        }
        let workspace = match self.api().create_workspace(name).await {
            Ok(workspace) => workspace,
            Err(e) => {
                self.store_ref()
                    .notify(NoticeLevel::Error, format!("Failed to create workspace: {}", e));
                return Err(e.into());
            }
        };
        self.store_ref().add_workspace(workspace.clone());
        self.select_workspace(&workspace.id).await?;
        Ok(workspace)
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.store_ref().workspaces()
    }

    /// Navigation tree of a workspace, trash excluded
    pub fn workspace_tree(&self, workspace_id: &str) -> Vec<TreeNode> {
        self.store_ref().workspace_tree(workspace_id)
    }

    pub fn current_tree(&self) -> Vec<TreeNode> {
        match self.store_ref().current_workspace_id() {
            Some(id) => self.workspace_tree(&id),
            None => Vec::new(),
        }
    }

    /// Rows of the current tree as displayed, with collapsed branches hidden
    pub fn tree_rows(&self) -> Vec<(Item, usize)> {
        visible_rows(&self.current_tree(), &self.store_ref().collapsed())
    }

    pub async fn workspace_progress(&self, workspace_id: &str) -> CommandResult<WorkspaceProgress> {
        self.api().workspace_progress(workspace_id).await.map_err(|e| {
            self.store_ref()
                .notify(NoticeLevel::Error, format!("Failed to load progress: {}", e));
            e.into()
        })
    }
}
