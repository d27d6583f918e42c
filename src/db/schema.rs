//! Database schema initialization

use rusqlite::params;

use super::{Database, DbError, SCHEMA_VERSION};

impl Database {
    /// Initialize database schema
    pub(super) fn init_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Asset types (each owns an ordered set of custom field definitions)
            CREATE TABLE IF NOT EXISTS asset_types (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            -- Custom field definitions, ordered by position within an asset type
            CREATE TABLE IF NOT EXISTS field_defs (
                id INTEGER PRIMARY KEY,
                asset_type_id INTEGER NOT NULL REFERENCES asset_types(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                data_type TEXT NOT NULL,
                required INTEGER NOT NULL DEFAULT 0,
                list_options TEXT,
                unit TEXT,
                description TEXT,
                position INTEGER NOT NULL,
                UNIQUE (asset_type_id, name)
            );
            CREATE INDEX IF NOT EXISTS idx_field_defs_type ON field_defs(asset_type_id);

            -- Master tables resolved during import
            CREATE TABLE IF NOT EXISTS manufacturers (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE
            );

            CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY,
                manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id) ON DELETE CASCADE,
                name TEXT NOT NULL COLLATE NOCASE,
                UNIQUE (manufacturer_id, name)
            );
            CREATE INDEX IF NOT EXISTS idx_models_manufacturer ON models(manufacturer_id);

            CREATE TABLE IF NOT EXISTS statuses (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS departments (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS acquisition_formats (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS providers (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                website TEXT,
                phone TEXT,
                email TEXT,
                address TEXT,
                description TEXT,
                created TEXT,
                updated TEXT
            );

            -- Assets; (serial_number, asset_type_id) is the natural key.
            -- NULL serials are distinct under UNIQUE, so serial-less rows
            -- always insert.
            CREATE TABLE IF NOT EXISTS assets (
                id INTEGER PRIMARY KEY,
                asset_type_id INTEGER NOT NULL REFERENCES asset_types(id),
                name TEXT NOT NULL,
                serial_number TEXT,
                manufacturer_id INTEGER REFERENCES manufacturers(id),
                model_id INTEGER REFERENCES models(id),
                status_id INTEGER REFERENCES statuses(id),
                location_id INTEGER REFERENCES locations(id),
                department_id INTEGER REFERENCES departments(id),
                provider_id INTEGER REFERENCES providers(id),
                acquisition_format_id INTEGER REFERENCES acquisition_formats(id),
                purchase_date TEXT,
                purchase_price REAL,
                description TEXT,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                UNIQUE (serial_number, asset_type_id)
            );
            CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(asset_type_id);
            CREATE INDEX IF NOT EXISTS idx_assets_status ON assets(status_id);

            -- Custom field values; one row per (asset, definition).
            -- Values follow their definition: deleting a definition deletes
            -- its values (no orphans).
            CREATE TABLE IF NOT EXISTS field_values (
                asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
                field_def_id INTEGER NOT NULL REFERENCES field_defs(id) ON DELETE CASCADE,
                value TEXT NOT NULL,
                PRIMARY KEY (asset_id, field_def_id)
            );

            -- Contracts; number is the natural key
            CREATE TABLE IF NOT EXISTS contracts (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                number TEXT NOT NULL UNIQUE,
                provider_id INTEGER REFERENCES providers(id),
                start_date TEXT,
                end_date TEXT,
                cost REAL,
                description TEXT,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
            );

            -- Audit trail, append-only
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                actor TEXT NOT NULL,
                operation TEXT NOT NULL,
                entity_kind TEXT NOT NULL,
                entity_id INTEGER NOT NULL,
                before TEXT,
                after TEXT,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_kind, entity_id);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}
