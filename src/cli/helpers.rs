//! Shared helper functions for CLI commands

use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::core::Workspace;

/// Resolve the workspace from global options or by discovery
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let workspace = match &global.project {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    };
    workspace.map_err(|e| miette::miette!("{}", e))
}

/// Render a simple table with a header row
pub fn print_table<H, R>(headers: H, rows: R)
where
    H: IntoIterator,
    H::Item: Into<String>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut builder = Builder::default();
    builder.push_record(headers.into_iter().map(Into::into).collect::<Vec<String>>());
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::sharp()));
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
