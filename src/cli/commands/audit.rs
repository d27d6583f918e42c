//! `rkl audit` command - Show recent audit trail entries

use console::style;
use miette::Result;

use crate::cli::helpers::{open_workspace, print_table};
use crate::cli::GlobalOpts;
use crate::db::Database;

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn run(args: AuditArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    let entries = db
        .list_audit(args.limit)
        .map_err(|e| miette::miette!("{}", e))?;
    if entries.is_empty() {
        println!("{}", style("Audit trail is empty.").yellow());
        return Ok(());
    }

    let rows = entries
        .into_iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.created,
                e.actor,
                e.operation,
                format!("{} #{}", e.entity_kind, e.entity_id),
            ]
        })
        .collect::<Vec<_>>();
    print_table(["ID", "When", "Actor", "Operation", "Entity"], rows);
    Ok(())
}
