//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory that marks a rackline workspace root
const WORKSPACE_DIR: &str = ".rackline";

/// Represents a rackline workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .rackline/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace structure at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let rackline_dir = root.join(WORKSPACE_DIR);
        if rackline_dir.exists() {
            return Err(WorkspaceError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(rackline_dir.join("imports"))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let config_path = rackline_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .rackline directory
    pub fn rackline_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Path to the SQLite database
    pub fn db_path(&self) -> PathBuf {
        self.rackline_dir().join("cmdb.db")
    }

    /// Path to the workspace config file
    pub fn config_path(&self) -> PathBuf {
        self.rackline_dir().join("config.yaml")
    }

    /// Path to the staged pending-import state, if any
    pub fn pending_path(&self) -> PathBuf {
        self.rackline_dir().join("pending_import.json")
    }

    /// Directory holding persisted import logs
    pub fn imports_dir(&self) -> PathBuf {
        self.rackline_dir().join("imports")
    }

    fn default_config() -> &'static str {
        r#"# Rackline workspace configuration
# actor: "Jane Operator"
"#
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no rackline workspace found (searched up from {searched_from}). Run `rkl init` first.")]
    NotFound { searched_from: PathBuf },

    #[error("workspace already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    IoError(String),
}
