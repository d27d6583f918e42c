//! Master-data lookups and creation
//!
//! Foreign keys in the import pipeline resolve against these tables by
//! name. Manufacturers and models compare case-insensitively (NOCASE
//! collation); the simple name tables match exactly.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError};

/// Simple name-keyed master tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterKind {
    Status,
    Location,
    Department,
    Provider,
    AcquisitionFormat,
}

impl MasterKind {
    pub fn table(&self) -> &'static str {
        match self {
            MasterKind::Status => "statuses",
            MasterKind::Location => "locations",
            MasterKind::Department => "departments",
            MasterKind::Provider => "providers",
            MasterKind::AcquisitionFormat => "acquisition_formats",
        }
    }

    /// Column name used in import error messages
    pub fn column(&self) -> &'static str {
        match self {
            MasterKind::Status => "status",
            MasterKind::Location => "location",
            MasterKind::Department => "department",
            MasterKind::Provider => "provider",
            MasterKind::AcquisitionFormat => "acquisition_format",
        }
    }
}

impl Database {
    /// Look up a row in a simple master table by exact name
    pub fn find_named_id(&self, kind: MasterKind, name: &str) -> Result<Option<i64>, DbError> {
        let sql = format!("SELECT id FROM {} WHERE name = ?1", kind.table());
        Ok(self
            .conn
            .query_row(&sql, params![name], |row| row.get(0))
            .optional()?)
    }

    /// Insert a row into a simple master table; fails on duplicate name
    pub fn create_named(&self, kind: MasterKind, name: &str) -> Result<i64, DbError> {
        let sql = format!("INSERT INTO {} (name) VALUES (?1)", kind.table());
        self.conn.execute(&sql, params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List a simple master table in creation order
    pub fn list_named(&self, kind: MasterKind) -> Result<Vec<(i64, String)>, DbError> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", kind.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up a manufacturer by name (case-insensitive)
    pub fn find_manufacturer(&self, name: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM manufacturers WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Look up a model within a manufacturer by name (case-insensitive)
    pub fn find_model(&self, manufacturer_id: i64, name: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM models WHERE manufacturer_id = ?1 AND name = ?2",
                params![manufacturer_id, name],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Find or create a manufacturer. Idempotent under the UNIQUE
    /// constraint: a concurrent creator wins and its row is reused.
    pub fn find_or_create_manufacturer(&self, name: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO manufacturers (name) VALUES (?1)",
            params![name],
        )?;
        self.conn
            .query_row(
                "SELECT id FROM manufacturers WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(DbError::from)
    }

    /// Find or create a model under a manufacturer (idempotent)
    pub fn find_or_create_model(&self, manufacturer_id: i64, name: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO models (manufacturer_id, name) VALUES (?1, ?2)",
            params![manufacturer_id, name],
        )?;
        self.conn
            .query_row(
                "SELECT id FROM models WHERE manufacturer_id = ?1 AND name = ?2",
                params![manufacturer_id, name],
                |row| row.get(0),
            )
            .map_err(DbError::from)
    }

    /// List manufacturers in creation order
    pub fn list_manufacturers(&self) -> Result<Vec<(i64, String)>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM manufacturers ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// List models with their manufacturer names
    pub fn list_models(&self) -> Result<Vec<(i64, String, String)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, mf.name, m.name
             FROM models m JOIN manufacturers mf ON m.manufacturer_id = mf.id
             ORDER BY mf.name, m.name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_lookup_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        let id = db.find_or_create_manufacturer("Lenovo").unwrap();
        assert_eq!(db.find_manufacturer("lenovo").unwrap(), Some(id));
        assert_eq!(db.find_manufacturer("LENOVO").unwrap(), Some(id));
        assert_eq!(db.find_manufacturer("Dell").unwrap(), None);
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let a = db.find_or_create_manufacturer("Lenovo").unwrap();
        let b = db.find_or_create_manufacturer("lenovo").unwrap();
        assert_eq!(a, b);

        let m1 = db.find_or_create_model(a, "ThinkPad T14").unwrap();
        let m2 = db.find_or_create_model(a, "thinkpad t14").unwrap();
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_named_masters_match_exactly() {
        let db = Database::open_in_memory().unwrap();
        db.create_named(MasterKind::Status, "In use").unwrap();
        assert!(db
            .find_named_id(MasterKind::Status, "In use")
            .unwrap()
            .is_some());
        assert!(db
            .find_named_id(MasterKind::Status, "in use")
            .unwrap()
            .is_none());
    }
}
