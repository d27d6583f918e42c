//! SQLite-backed CMDB store
//!
//! This module owns the primary database: asset types with their custom
//! field definitions, the master tables referenced during import, the
//! assets/contracts themselves, per-asset field values, and the audit
//! trail. Schema changes bump SCHEMA_VERSION; a mismatch drops and
//! rebuilds all tables.

mod assets;
mod audit;
mod masters;
mod registry;
mod schema;

pub use assets::{AssetDetail, AssetRecord, AssetRow, ContractRecord, ProviderRecord};
pub use audit::AuditEntry;
pub use masters::MasterKind;

use rusqlite::Connection;
use std::fs;
use thiserror::Error;

use crate::core::Workspace;

/// Current schema version - database is rebuilt on version mismatch
const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The CMDB database backed by SQLite
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the workspace database
    pub fn open(workspace: &Workspace) -> Result<Self, DbError> {
        let db_path = workspace.db_path();

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let needs_init = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self { conn };

        if needs_init {
            db.init_schema()?;
        } else if db.needs_schema_rebuild()? {
            db.reinitialize_schema()?;
        }

        Ok(db)
    }

    /// Open an in-memory database (for tests)
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Check if schema version matches current version
    fn needs_schema_rebuild(&self) -> Result<bool, DbError> {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(current_version != SCHEMA_VERSION)
    }

    /// Drop all tables and reinitialize with the current schema
    fn reinitialize_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS schema_version;
            DROP TABLE IF EXISTS field_values;
            DROP TABLE IF EXISTS field_defs;
            DROP TABLE IF EXISTS assets;
            DROP TABLE IF EXISTS contracts;
            DROP TABLE IF EXISTS models;
            DROP TABLE IF EXISTS manufacturers;
            DROP TABLE IF EXISTS statuses;
            DROP TABLE IF EXISTS locations;
            DROP TABLE IF EXISTS departments;
            DROP TABLE IF EXISTS providers;
            DROP TABLE IF EXISTS acquisition_formats;
            DROP TABLE IF EXISTS asset_types;
            DROP TABLE IF EXISTS audit_log;
            "#,
        )?;

        self.init_schema()
    }

    /// Begin a per-row savepoint during import commit
    pub(crate) fn row_savepoint_begin(&self) -> Result<(), DbError> {
        self.conn.execute_batch("SAVEPOINT import_row;")?;
        Ok(())
    }

    /// Release (commit) the per-row savepoint
    pub(crate) fn row_savepoint_commit(&self) -> Result<(), DbError> {
        self.conn.execute_batch("RELEASE import_row;")?;
        Ok(())
    }

    /// Roll back everything written since the per-row savepoint
    pub(crate) fn row_savepoint_rollback(&self) -> Result<(), DbError> {
        self.conn
            .execute_batch("ROLLBACK TO import_row; RELEASE import_row;")?;
        Ok(())
    }
}
