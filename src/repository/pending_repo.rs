//! Pending Operation Repository
//!
//! SQLite-backed storage for queued operations. Rows are kept in insertion
//! order; the full operation is stored as JSON.

use rusqlite::{params, OptionalExtension};

use crate::domain::{DomainResult, PendingOperation};
use super::db::DbConn;

pub struct PendingRepository {
    conn: DbConn,
}

impl PendingRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Insert an operation, replacing any row with the same key.
    /// A replaced row keeps its place in the queue.
    pub async fn upsert(&self, op: &PendingOperation) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        let payload = serde_json::to_string(op)?;

        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM pending_operations",
            [],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO pending_operations (id, seq, op_type, timestamp, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                op_type = excluded.op_type,
                timestamp = excluded.timestamp,
                payload = excluded.payload",
            params![op.id, seq, op.op_type().as_str(), op.timestamp, payload],
        )?;
        Ok(())
    }

    /// Rewrite the stored payload of an existing operation
    pub async fn update(&self, op: &PendingOperation) -> DomainResult<bool> {
        let conn = self.conn.lock().await;
        let payload = serde_json::to_string(op)?;
        let changed = conn.execute(
            "UPDATE pending_operations SET op_type = ?1, timestamp = ?2, payload = ?3 WHERE id = ?4",
            params![op.op_type().as_str(), op.timestamp, payload, op.id],
        )?;
        Ok(changed > 0)
    }

    /// All queued operations, oldest first
    pub async fn list(&self) -> DomainResult<Vec<PendingOperation>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id, payload FROM pending_operations ORDER BY seq ASC")?;
        let mut rows = stmt.query([])?;

        let mut ops = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let payload: String = row.get(1)?;
            match serde_json::from_str::<PendingOperation>(&payload) {
                Ok(op) => ops.push(op),
                // A row we cannot read would block the queue forever
                Err(e) => log::error!("Skipping unreadable pending operation {}: {}", id, e),
            }
        }
        Ok(ops)
    }

    pub async fn find(&self, id: &str) -> DomainResult<Option<PendingOperation>> {
        let conn = self.conn.lock().await;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM pending_operations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match payload {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        })
    }

    pub async fn count(&self) -> DomainResult<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pending_operations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete the given keys; returns how many rows went away
    pub async fn remove(&self, ids: &[String]) -> DomainResult<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM pending_operations WHERE id = ?1")?;
            for id in ids {
                removed += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Remove operations as they were read. A row replaced since then (same
    /// key, newer timestamp) stays queued.
    pub async fn remove_sent(&self, ops: &[PendingOperation]) -> DomainResult<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt =
                tx.prepare("DELETE FROM pending_operations WHERE id = ?1 AND timestamp = ?2")?;
            for op in ops {
                removed += stmt.execute(params![op.id, op.timestamp])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Drop the oldest rows until at most `capacity` remain.
    /// Returns the dropped operations' keys.
    pub async fn trim_to(&self, capacity: usize) -> DomainResult<Vec<String>> {
        let conn = self.conn.lock().await;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM pending_operations", [], |row| row.get(0))?;
        let excess = total - capacity as i64;
        if excess <= 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare("SELECT id FROM pending_operations ORDER BY seq ASC LIMIT ?1")?;
        let mut rows = stmt.query(params![excess])?;
        let mut dropped = Vec::new();
        while let Some(row) = rows.next()? {
            dropped.push(row.get::<_, String>(0)?);
        }
        drop(rows);
        drop(stmt);

        for id in &dropped {
            conn.execute("DELETE FROM pending_operations WHERE id = ?1", params![id])?;
        }
        Ok(dropped)
    }

    pub async fn clear(&self) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM pending_operations", [])?;
        Ok(())
    }
}
