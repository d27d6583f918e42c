//! Asset types and the custom-field schema registry

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError};
use crate::import::fields::{FieldDef, FieldType};

impl Database {
    /// Create an asset type; fails on duplicate name
    pub fn create_asset_type(&self, name: &str) -> Result<i64, DbError> {
        self.conn
            .execute("INSERT INTO asset_types (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up an asset type by exact name
    pub fn find_asset_type(&self, name: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM asset_types WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// List all asset types in creation order
    pub fn list_asset_types(&self) -> Result<Vec<(i64, String)>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM asset_types ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Add a field definition at the end of the asset type's registry order
    pub fn create_field_def(
        &self,
        asset_type_id: i64,
        name: &str,
        data_type: FieldType,
        required: bool,
        list_options: &[String],
        unit: Option<&str>,
        description: Option<&str>,
    ) -> Result<i64, DbError> {
        let next_position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM field_defs WHERE asset_type_id = ?1",
            params![asset_type_id],
            |row| row.get(0),
        )?;

        let options_json = if list_options.is_empty() {
            None
        } else {
            Some(serde_json::to_string(list_options).unwrap_or_default())
        };

        self.conn.execute(
            "INSERT INTO field_defs (asset_type_id, name, data_type, required, list_options, unit, description, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                asset_type_id,
                name,
                data_type.as_str(),
                required,
                options_json,
                unit,
                description,
                next_position
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List field definitions for an asset type, in registry order.
    ///
    /// An unknown asset type yields an empty list, not an error - callers
    /// treat "no custom fields" as valid.
    pub fn list_field_defs(&self, asset_type_id: i64) -> Result<Vec<FieldDef>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, asset_type_id, name, data_type, required, list_options, unit, description, position
             FROM field_defs WHERE asset_type_id = ?1 ORDER BY position, id",
        )?;

        let rows = stmt.query_map(params![asset_type_id], |row| {
            let data_type_str: String = row.get(3)?;
            let options_json: Option<String> = row.get(5)?;
            Ok(FieldDef {
                id: row.get(0)?,
                asset_type_id: row.get(1)?,
                name: row.get(2)?,
                data_type: data_type_str.parse().unwrap_or(FieldType::Text),
                required: row.get(4)?,
                list_options: options_json
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .unwrap_or_default(),
                unit: row.get(6)?,
                description: row.get(7)?,
                position: row.get(8)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a field definition by name; values cascade with it.
    /// Returns false if no such definition exists.
    pub fn delete_field_def(&self, asset_type_id: i64, name: &str) -> Result<bool, DbError> {
        let affected = self.conn.execute(
            "DELETE FROM field_defs WHERE asset_type_id = ?1 AND name = ?2",
            params![asset_type_id, name],
        )?;
        Ok(affected > 0)
    }
}
