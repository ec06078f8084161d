//! Sync Commands
//!
//! Connectivity state and replay of the pending queue.

use std::sync::atomic::Ordering;

use crate::domain::PendingOperation;
use crate::store::NoticeLevel;
use crate::sync::SyncOutcome;
use super::{CommandResult, Organizer};

impl Organizer {
    pub fn is_online(&self) -> bool {
        self.backend.is_online()
    }

    /// Going online replays the queue and reloads from the server
    pub async fn set_online(&self, online: bool) -> CommandResult<()> {
        let was_online = self.backend.online.swap(online, Ordering::AcqRel);
        if online == was_online {
            return Ok(());
        }
        log::info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        if !online {
            return Ok(());
        }

        if let SyncOutcome::Synced(report) = self.flush_pending().await? {
            if report.rejected.is_empty() {
                self.store_ref().notify(
                    NoticeLevel::Success,
                    format!("Synced {} offline changes", report.submitted),
                );
            }
        }
        self.resync().await?;
        Ok(())
    }

    /// Send everything queued in one batch
    pub async fn flush_pending(&self) -> CommandResult<SyncOutcome> {
        let outcome = self.queue().sync(self.api(), self.store_ref()).await?;
        Ok(outcome)
    }

    pub async fn pending_count(&self) -> CommandResult<usize> {
        Ok(self.queue().len().await?)
    }

    pub async fn pending_operations(&self) -> CommandResult<Vec<PendingOperation>> {
        Ok(self.queue().pending().await?)
    }
}
