//! Staged pending-import state
//!
//! Pre-analysis results wait for confirmation in a single JSON file under
//! the workspace. Exactly one pending import may exist at a time; a new
//! upload while one is staged is a conflict, and confirming or cancelling
//! a state that no longer exists is an error rather than a silent no-op.
//! The staged file's digest is recorded so a confirm never commits a file
//! that changed on disk after analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::analyze::NewModel;
use super::parser::NormalizedRow;
use super::{EntityKind, ImportError};
use crate::core::Workspace;

/// A staged import awaiting confirmation
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingImport {
    pub run_id: String,
    pub entity: EntityKind,
    pub asset_type_id: Option<i64>,
    pub asset_type_name: Option<String>,
    pub source_file: PathBuf,
    pub file_sha256: String,
    pub created: DateTime<Utc>,
    pub new_models: Vec<NewModel>,
    /// Rows staged verbatim so the commit does not re-parse the file
    pub rows: Vec<NormalizedRow>,
}

impl PendingImport {
    /// True if a pending import is staged in this workspace
    pub fn exists(workspace: &Workspace) -> bool {
        workspace.pending_path().exists()
    }

    /// Stage this pending import. Fails if one already exists.
    pub fn save(&self, workspace: &Workspace) -> Result<(), ImportError> {
        let path = workspace.pending_path();
        if path.exists() {
            return Err(ImportError::PendingExists);
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Load the staged pending import
    pub fn load(workspace: &Workspace) -> Result<Self, ImportError> {
        let path = workspace.pending_path();
        if !path.exists() {
            return Err(ImportError::NoPending("resolve"));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Drop the staged pending import (confirm consumed it, or cancel)
    pub fn clear(workspace: &Workspace) -> Result<(), ImportError> {
        let path = workspace.pending_path();
        if !path.exists() {
            return Err(ImportError::NoPending("cancel"));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Verify the staged source file still matches the analyzed digest
    pub fn verify_digest(&self) -> Result<(), ImportError> {
        let current = file_digest(&self.source_file)?;
        if current != self.file_sha256 {
            return Err(ImportError::DigestMismatch(self.source_file.clone()));
        }
        Ok(())
    }
}

/// SHA-256 hex digest of a file's contents
pub fn file_digest(path: &Path) -> Result<String, ImportError> {
    let contents = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pending(ws: &Workspace, file: PathBuf) -> PendingImport {
        PendingImport {
            run_id: "01TESTRUN".to_string(),
            entity: EntityKind::Assets,
            asset_type_id: Some(1),
            asset_type_name: Some("Laptop".to_string()),
            file_sha256: file_digest(&file).unwrap(),
            source_file: file,
            created: Utc::now(),
            new_models: vec![NewModel {
                manufacturer: "Lenovo".to_string(),
                model: "ThinkPad T14".to_string(),
            }],
            rows: Vec::new(),
        }
    }

    fn setup() -> (TempDir, Workspace, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let csv = tmp.path().join("upload.csv");
        std::fs::write(&csv, "name;serial_number\n").unwrap();
        (tmp, ws, csv)
    }

    #[test]
    fn test_round_trip() {
        let (_tmp, ws, csv) = setup();
        let state = pending(&ws, csv);
        state.save(&ws).unwrap();

        let loaded = PendingImport::load(&ws).unwrap();
        assert_eq!(loaded.run_id, state.run_id);
        assert_eq!(loaded.entity, EntityKind::Assets);
        assert_eq!(loaded.new_models, state.new_models);

        PendingImport::clear(&ws).unwrap();
        assert!(!PendingImport::exists(&ws));
    }

    #[test]
    fn test_second_save_conflicts() {
        let (_tmp, ws, csv) = setup();
        pending(&ws, csv.clone()).save(&ws).unwrap();
        assert!(matches!(
            pending(&ws, csv).save(&ws),
            Err(ImportError::PendingExists)
        ));
    }

    #[test]
    fn test_stale_load_and_clear_fail() {
        let (_tmp, ws, _csv) = setup();
        assert!(matches!(
            PendingImport::load(&ws),
            Err(ImportError::NoPending(_))
        ));
        assert!(matches!(
            PendingImport::clear(&ws),
            Err(ImportError::NoPending(_))
        ));
    }

    #[test]
    fn test_digest_guard() {
        let (_tmp, ws, csv) = setup();
        let state = pending(&ws, csv.clone());
        state.verify_digest().unwrap();

        std::fs::write(&csv, "name;serial_number\nchanged;SN1\n").unwrap();
        assert!(matches!(
            state.verify_digest(),
            Err(ImportError::DigestMismatch(_))
        ));
    }
}
