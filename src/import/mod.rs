//! Bulk CSV import pipeline
//!
//! The pipeline runs in stages: a CSV template is generated from the
//! per-asset-type field schema (`template`), an uploaded file is parsed
//! and normalized against that schema (`parser`), rows are scanned for
//! manufacturer/model pairs that do not exist yet (`analyze`), detected
//! pairs are staged for confirmation (`pending`), confirmed batches are
//! committed row by row (`commit`), and outcomes are aggregated into a
//! persisted log (`report`).
//!
//! File-level problems (bad extension, missing required header) abort
//! before any row is touched. Row-level problems mark the single row as
//! an error and never interrupt the batch.

pub mod analyze;
pub mod commit;
pub mod fields;
pub mod parser;
pub mod pending;
pub mod report;
pub mod template;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::db::DbError;

/// Entity kinds the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Dynamic schema: core columns plus one column per field definition
    Assets,
    /// Fixed schema
    Contracts,
    /// Fixed schema
    Providers,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Assets => "assets",
            EntityKind::Contracts => "contracts",
            EntityKind::Providers => "providers",
        }
    }

    /// Core column set, in template order
    pub fn core_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Assets => &[
                "name",
                "serial_number",
                "manufacturer",
                "model",
                "status",
                "location",
                "department",
                "provider",
                "acquisition_format",
                "purchase_date",
                "purchase_price",
                "description",
            ],
            EntityKind::Contracts => &[
                "name",
                "number",
                "provider",
                "start_date",
                "end_date",
                "cost",
                "description",
            ],
            EntityKind::Providers => &[
                "name",
                "website",
                "phone",
                "email",
                "address",
                "description",
            ],
        }
    }

    /// Columns that must be present in an uploaded file's header
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Assets => &["name", "serial_number", "manufacturer", "model", "status"],
            EntityKind::Contracts => &["name", "number"],
            EntityKind::Providers => &["name"],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assets" | "asset" => Ok(EntityKind::Assets),
            "contracts" | "contract" => Ok(EntityKind::Contracts),
            "providers" | "provider" => Ok(EntityKind::Providers),
            _ => Err(format!(
                "Unsupported entity type: '{}'. Supported: assets, contracts, providers",
                s
            )),
        }
    }
}

/// Import pipeline errors.
///
/// Everything here is file-level or state-level: it aborts before any
/// row is committed. Row-level problems travel inside NormalizedRow and
/// RowResult instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("not a CSV file: {0} (expected a .csv extension)")]
    NotCsv(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{column}' in header")]
    MissingColumn { column: String },

    #[error("unknown asset type: '{0}'")]
    UnknownAssetType(String),

    #[error("an asset type is required for asset imports (use --type)")]
    AssetTypeRequired,

    #[error("a pending import exists; run `rkl import confirm` or `rkl import cancel` first")]
    PendingExists,

    #[error("no pending import to {0}")]
    NoPending(&'static str),

    #[error("staged file {0} changed since analysis; cancel and re-run the import")]
    DigestMismatch(PathBuf),

    #[error("pending state error: {0}")]
    State(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}
