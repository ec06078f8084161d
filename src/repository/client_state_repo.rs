//! Client State Repository
//!
//! Small key/value table for state that must outlive the process.

use rusqlite::{params, OptionalExtension};

use crate::domain::DomainResult;
use super::db::DbConn;

const USER_ID_KEY: &str = "user_id";
const LAST_WORKSPACE_KEY: &str = "last_workspace_id";

pub struct ClientStateRepository {
    conn: DbConn,
}

impl ClientStateRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        let now = chrono::Local::now().timestamp_millis();
        conn.execute(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ========================
    // Typed accessors
    // ========================

    pub async fn user_id(&self) -> DomainResult<Option<String>> {
        Ok(self.get(USER_ID_KEY).await?.filter(|id| !id.trim().is_empty()))
    }

    pub async fn set_user_id(&self, user_id: &str) -> DomainResult<()> {
        self.set(USER_ID_KEY, user_id).await
    }

    pub async fn last_workspace_id(&self) -> DomainResult<Option<String>> {
        self.get(LAST_WORKSPACE_KEY).await
    }

    pub async fn set_last_workspace_id(&self, workspace_id: Option<&str>) -> DomainResult<()> {
        match workspace_id {
            Some(id) => self.set(LAST_WORKSPACE_KEY, id).await,
            None => self.remove(LAST_WORKSPACE_KEY).await,
        }
    }
}
