//! Result aggregation and the persisted import log
//!
//! A run's per-row results roll up into an ImportSummary; the summary is
//! written as a flat log file keyed by the run id. Run ids are ULIDs, so
//! a lexical sort of the log directory yields chronological order and
//! "latest" is just the maximum filename.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use ulid::Ulid;

use super::commit::{RowOutcome, RowResult};
use crate::core::Workspace;

/// Aggregated outcome of one import run
#[derive(Debug)]
pub struct ImportSummary {
    pub run_id: String,
    pub source_file: PathBuf,
    pub file_sha256: String,
    pub finished: DateTime<Utc>,
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<RowResult>,
}

impl ImportSummary {
    pub fn from_results(
        run_id: String,
        source_file: PathBuf,
        file_sha256: String,
        results: Vec<RowResult>,
    ) -> Self {
        let created = results
            .iter()
            .filter(|r| r.outcome == RowOutcome::Created)
            .count();
        let updated = results
            .iter()
            .filter(|r| r.outcome == RowOutcome::Updated)
            .count();
        let failed = results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .count();

        Self {
            run_id,
            source_file,
            file_sha256,
            finished: Utc::now(),
            total: results.len(),
            created,
            updated,
            failed,
            results,
        }
    }

    pub fn successful(&self) -> usize {
        self.created + self.updated
    }

    /// Render the flat log format persisted to disk
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        out.push_str("# rackline import log\n");
        out.push_str(&format!("run: {}\n", self.run_id));
        out.push_str(&format!("file: {}\n", self.source_file.display()));
        out.push_str(&format!("sha256: {}\n", self.file_sha256));
        out.push_str(&format!("finished: {}\n", self.finished.to_rfc3339()));
        out.push_str(&format!(
            "total: {}  created: {}  updated: {}  failed: {}\n\n",
            self.total, self.created, self.updated, self.failed
        ));
        for result in &self.results {
            out.push_str(&format!("row {}: {}\n", result.line, result.outcome));
        }
        out
    }
}

/// Mint a run identifier
pub fn new_run_id() -> String {
    Ulid::new().to_string()
}

/// Path of the log file for a given run
pub fn log_path(workspace: &Workspace, run_id: &str) -> PathBuf {
    workspace.imports_dir().join(format!("{}.log", run_id))
}

/// Persist the detail log; returns the log file path
pub fn persist_log(workspace: &Workspace, summary: &ImportSummary) -> std::io::Result<PathBuf> {
    let dir = workspace.imports_dir();
    fs::create_dir_all(&dir)?;
    let path = log_path(workspace, &summary.run_id);
    fs::write(&path, summary.render_log())?;
    Ok(path)
}

/// Most recent import log, if any (ULID filenames sort chronologically)
pub fn latest_log(workspace: &Workspace) -> Option<PathBuf> {
    let entries = fs::read_dir(workspace.imports_dir()).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("log"))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn results() -> Vec<RowResult> {
        vec![
            RowResult {
                line: 2,
                outcome: RowOutcome::Created,
            },
            RowResult {
                line: 3,
                outcome: RowOutcome::Updated,
            },
            RowResult {
                line: 4,
                outcome: RowOutcome::Error("status: no match for 'Broken'".to_string()),
            },
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = ImportSummary::from_results(
            new_run_id(),
            PathBuf::from("upload.csv"),
            "deadbeef".to_string(),
            results(),
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.successful(), 2);
    }

    #[test]
    fn test_log_render_cites_rows() {
        let summary = ImportSummary::from_results(
            "01RUN".to_string(),
            PathBuf::from("upload.csv"),
            "deadbeef".to_string(),
            results(),
        );
        let log = summary.render_log();
        assert!(log.contains("run: 01RUN"));
        assert!(log.contains("row 2: created"));
        assert!(log.contains("row 4: error status: no match for 'Broken'"));
    }

    #[test]
    fn test_persist_and_latest() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        let older = ImportSummary::from_results(
            "01AAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
            PathBuf::from("a.csv"),
            "aa".to_string(),
            vec![],
        );
        let newer = ImportSummary::from_results(
            "01ZZZZZZZZZZZZZZZZZZZZZZZZ".to_string(),
            PathBuf::from("b.csv"),
            "bb".to_string(),
            vec![],
        );
        persist_log(&ws, &older).unwrap();
        let newer_path = persist_log(&ws, &newer).unwrap();

        assert_eq!(latest_log(&ws), Some(newer_path));
    }

    #[test]
    fn test_run_ids_are_sortable() {
        let a = new_run_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_run_id();
        assert!(a < b);
    }
}
