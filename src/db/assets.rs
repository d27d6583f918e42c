//! Asset, contract, and provider persistence
//!
//! Upserts are keyed by natural key: (serial_number, asset_type) for
//! assets, number for contracts, name for providers. Snapshots feed the
//! audit trail as before/after JSON.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::json;

use super::{Database, DbError};

/// Core columns of an asset row, with foreign keys already resolved
#[derive(Debug, Clone, Default)]
pub struct AssetRecord {
    pub asset_type_id: i64,
    pub name: String,
    pub serial_number: Option<String>,
    pub manufacturer_id: Option<i64>,
    pub model_id: Option<i64>,
    pub status_id: Option<i64>,
    pub location_id: Option<i64>,
    pub department_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub acquisition_format_id: Option<i64>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub description: Option<String>,
}

/// Summary row for `asset list`
#[derive(Debug)]
pub struct AssetRow {
    pub id: i64,
    pub name: String,
    pub serial_number: Option<String>,
    pub asset_type: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
}

/// Full asset view for `asset show`
#[derive(Debug)]
pub struct AssetDetail {
    pub row: AssetRow,
    pub location: Option<String>,
    pub department: Option<String>,
    pub provider: Option<String>,
    pub acquisition_format: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub description: Option<String>,
    /// (field name, stored value, unit) in registry order
    pub custom_fields: Vec<(String, String, Option<String>)>,
}

/// Core columns of a contract row
#[derive(Debug, Clone, Default)]
pub struct ContractRecord {
    pub name: String,
    pub number: String,
    pub provider_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cost: Option<f64>,
    pub description: Option<String>,
}

/// Core columns of a provider row
#[derive(Debug, Clone, Default)]
pub struct ProviderRecord {
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl Database {
    /// Find an asset by its natural key. Serial-less rows have no natural
    /// key and never match.
    pub fn find_asset_by_natural_key(
        &self,
        asset_type_id: i64,
        serial_number: &str,
    ) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM assets WHERE asset_type_id = ?1 AND serial_number = ?2",
                params![asset_type_id, serial_number],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn insert_asset(&self, rec: &AssetRecord) -> Result<i64, DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO assets (asset_type_id, name, serial_number, manufacturer_id, model_id,
                status_id, location_id, department_id, provider_id, acquisition_format_id,
                purchase_date, purchase_price, description, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
            params![
                rec.asset_type_id,
                rec.name,
                rec.serial_number,
                rec.manufacturer_id,
                rec.model_id,
                rec.status_id,
                rec.location_id,
                rec.department_id,
                rec.provider_id,
                rec.acquisition_format_id,
                rec.purchase_date,
                rec.purchase_price,
                rec.description,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update mutable fields of an existing asset (natural key stays put)
    pub fn update_asset(&self, id: i64, rec: &AssetRecord) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE assets SET name = ?2, manufacturer_id = ?3, model_id = ?4, status_id = ?5,
                location_id = ?6, department_id = ?7, provider_id = ?8, acquisition_format_id = ?9,
                purchase_date = ?10, purchase_price = ?11, description = ?12, updated = ?13
             WHERE id = ?1",
            params![
                id,
                rec.name,
                rec.manufacturer_id,
                rec.model_id,
                rec.status_id,
                rec.location_id,
                rec.department_id,
                rec.provider_id,
                rec.acquisition_format_id,
                rec.purchase_date,
                rec.purchase_price,
                rec.description,
                now
            ],
        )?;
        Ok(())
    }

    /// Write one custom field value (insert or overwrite)
    pub fn write_field_value(
        &self,
        asset_id: i64,
        field_def_id: i64,
        value: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO field_values (asset_id, field_def_id, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (asset_id, field_def_id) DO UPDATE SET value = excluded.value",
            params![asset_id, field_def_id, value],
        )?;
        Ok(())
    }

    /// Custom field values for an asset, in registry order
    pub fn field_values_for(
        &self,
        asset_id: i64,
    ) -> Result<Vec<(String, String, Option<String>)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.name, v.value, d.unit
             FROM field_values v JOIN field_defs d ON v.field_def_id = d.id
             WHERE v.asset_id = ?1 ORDER BY d.position, d.id",
        )?;
        let rows = stmt.query_map(params![asset_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// JSON snapshot of an asset (core columns plus custom field values),
    /// used for audit before/after records
    pub fn asset_snapshot(&self, id: i64) -> Result<Option<serde_json::Value>, DbError> {
        let core = self
            .conn
            .query_row(
                "SELECT name, serial_number, manufacturer_id, model_id, status_id, location_id,
                        department_id, provider_id, acquisition_format_id, purchase_date,
                        purchase_price, description
                 FROM assets WHERE id = ?1",
                params![id],
                |row| {
                    Ok(json!({
                        "name": row.get::<_, String>(0)?,
                        "serial_number": row.get::<_, Option<String>>(1)?,
                        "manufacturer_id": row.get::<_, Option<i64>>(2)?,
                        "model_id": row.get::<_, Option<i64>>(3)?,
                        "status_id": row.get::<_, Option<i64>>(4)?,
                        "location_id": row.get::<_, Option<i64>>(5)?,
                        "department_id": row.get::<_, Option<i64>>(6)?,
                        "provider_id": row.get::<_, Option<i64>>(7)?,
                        "acquisition_format_id": row.get::<_, Option<i64>>(8)?,
                        "purchase_date": row.get::<_, Option<String>>(9)?,
                        "purchase_price": row.get::<_, Option<f64>>(10)?,
                        "description": row.get::<_, Option<String>>(11)?,
                    }))
                },
            )
            .optional()?;

        let Some(mut snapshot) = core else {
            return Ok(None);
        };

        let fields: serde_json::Map<String, serde_json::Value> = self
            .field_values_for(id)?
            .into_iter()
            .map(|(name, value, _)| (name, serde_json::Value::String(value)))
            .collect();
        snapshot["custom_fields"] = serde_json::Value::Object(fields);

        Ok(Some(snapshot))
    }

    /// List assets, optionally filtered by asset type
    pub fn list_assets(
        &self,
        asset_type_id: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<AssetRow>, DbError> {
        let mut sql = String::from(
            "SELECT a.id, a.name, a.serial_number, t.name, mf.name, mo.name, s.name
             FROM assets a
             JOIN asset_types t ON a.asset_type_id = t.id
             LEFT JOIN manufacturers mf ON a.manufacturer_id = mf.id
             LEFT JOIN models mo ON a.model_id = mo.id
             LEFT JOIN statuses s ON a.status_id = s.id",
        );
        if asset_type_id.is_some() {
            sql.push_str(" WHERE a.asset_type_id = ?1");
        }
        sql.push_str(" ORDER BY a.id");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(AssetRow {
                id: row.get(0)?,
                name: row.get(1)?,
                serial_number: row.get(2)?,
                asset_type: row.get(3)?,
                manufacturer: row.get(4)?,
                model: row.get(5)?,
                status: row.get(6)?,
            })
        };
        let rows = match asset_type_id {
            Some(id) => stmt.query_map(params![id], map_row)?.collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    /// Full detail for one asset, including custom field values
    pub fn get_asset_detail(&self, id: i64) -> Result<Option<AssetDetail>, DbError> {
        let detail = self
            .conn
            .query_row(
                "SELECT a.id, a.name, a.serial_number, t.name, mf.name, mo.name, s.name,
                        l.name, d.name, p.name, af.name, a.purchase_date, a.purchase_price,
                        a.description
                 FROM assets a
                 JOIN asset_types t ON a.asset_type_id = t.id
                 LEFT JOIN manufacturers mf ON a.manufacturer_id = mf.id
                 LEFT JOIN models mo ON a.model_id = mo.id
                 LEFT JOIN statuses s ON a.status_id = s.id
                 LEFT JOIN locations l ON a.location_id = l.id
                 LEFT JOIN departments d ON a.department_id = d.id
                 LEFT JOIN providers p ON a.provider_id = p.id
                 LEFT JOIN acquisition_formats af ON a.acquisition_format_id = af.id
                 WHERE a.id = ?1",
                params![id],
                |row| {
                    Ok(AssetDetail {
                        row: AssetRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            serial_number: row.get(2)?,
                            asset_type: row.get(3)?,
                            manufacturer: row.get(4)?,
                            model: row.get(5)?,
                            status: row.get(6)?,
                        },
                        location: row.get(7)?,
                        department: row.get(8)?,
                        provider: row.get(9)?,
                        acquisition_format: row.get(10)?,
                        purchase_date: row.get(11)?,
                        purchase_price: row.get(12)?,
                        description: row.get(13)?,
                        custom_fields: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut detail) = detail else {
            return Ok(None);
        };
        detail.custom_fields = self.field_values_for(id)?;
        Ok(Some(detail))
    }

    // ------------------------------------------------------------------
    // Contracts
    // ------------------------------------------------------------------

    pub fn find_contract_by_number(&self, number: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM contracts WHERE number = ?1",
                params![number],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn insert_contract(&self, rec: &ContractRecord) -> Result<i64, DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO contracts (name, number, provider_id, start_date, end_date, cost, description, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                rec.name,
                rec.number,
                rec.provider_id,
                rec.start_date,
                rec.end_date,
                rec.cost,
                rec.description,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_contract(&self, id: i64, rec: &ContractRecord) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE contracts SET name = ?2, provider_id = ?3, start_date = ?4, end_date = ?5,
                cost = ?6, description = ?7, updated = ?8
             WHERE id = ?1",
            params![
                id,
                rec.name,
                rec.provider_id,
                rec.start_date,
                rec.end_date,
                rec.cost,
                rec.description,
                now
            ],
        )?;
        Ok(())
    }

    pub fn contract_snapshot(&self, id: i64) -> Result<Option<serde_json::Value>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT name, number, provider_id, start_date, end_date, cost, description
                 FROM contracts WHERE id = ?1",
                params![id],
                |row| {
                    Ok(json!({
                        "name": row.get::<_, String>(0)?,
                        "number": row.get::<_, String>(1)?,
                        "provider_id": row.get::<_, Option<i64>>(2)?,
                        "start_date": row.get::<_, Option<String>>(3)?,
                        "end_date": row.get::<_, Option<String>>(4)?,
                        "cost": row.get::<_, Option<f64>>(5)?,
                        "description": row.get::<_, Option<String>>(6)?,
                    }))
                },
            )
            .optional()?)
    }

    // ------------------------------------------------------------------
    // Providers (imported as a full entity, beyond the name-only master)
    // ------------------------------------------------------------------

    pub fn find_provider_by_name(&self, name: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM providers WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn insert_provider(&self, rec: &ProviderRecord) -> Result<i64, DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO providers (name, website, phone, email, address, description, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                rec.name,
                rec.website,
                rec.phone,
                rec.email,
                rec.address,
                rec.description,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_provider(&self, id: i64, rec: &ProviderRecord) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE providers SET website = ?2, phone = ?3, email = ?4, address = ?5,
                description = ?6, updated = ?7
             WHERE id = ?1",
            params![
                id,
                rec.website,
                rec.phone,
                rec.email,
                rec.address,
                rec.description,
                now
            ],
        )?;
        Ok(())
    }

    pub fn provider_snapshot(&self, id: i64) -> Result<Option<serde_json::Value>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT name, website, phone, email, address, description
                 FROM providers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(json!({
                        "name": row.get::<_, String>(0)?,
                        "website": row.get::<_, Option<String>>(1)?,
                        "phone": row.get::<_, Option<String>>(2)?,
                        "email": row.get::<_, Option<String>>(3)?,
                        "address": row.get::<_, Option<String>>(4)?,
                        "description": row.get::<_, Option<String>>(5)?,
                    }))
                },
            )
            .optional()?)
    }
}
