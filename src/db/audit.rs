//! Append-only audit trail

use chrono::Utc;
use rusqlite::params;

use super::{Database, DbError};

/// One audit trail entry
#[derive(Debug)]
pub struct AuditEntry {
    pub id: i64,
    pub actor: String,
    pub operation: String,
    pub entity_kind: String,
    pub entity_id: i64,
    pub before: Option<String>,
    pub after: Option<String>,
    pub created: String,
}

impl Database {
    /// Append an audit entry with optional before/after snapshots
    pub fn append_audit(
        &self,
        actor: &str,
        operation: &str,
        entity_kind: &str,
        entity_id: i64,
        before: Option<&serde_json::Value>,
        after: Option<&serde_json::Value>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO audit_log (actor, operation, entity_kind, entity_id, before, after, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                actor,
                operation,
                entity_kind,
                entity_id,
                before.map(|v| v.to_string()),
                after.map(|v| v.to_string()),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Most recent audit entries, newest first
    pub fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor, operation, entity_kind, entity_id, before, after, created
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(AuditEntry {
                id: row.get(0)?,
                actor: row.get(1)?,
                operation: row.get(2)?,
                entity_kind: row.get(3)?,
                entity_id: row.get(4)?,
                before: row.get(5)?,
                after: row.get(6)?,
                created: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
