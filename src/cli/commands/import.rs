//! `rkl import` command - Bulk CSV import pipeline
//!
//! `template` writes a header-only CSV to stdout, `run` parses and
//! commits an uploaded file (pausing for confirmation when new
//! manufacturer/model pairs are detected), `confirm`/`cancel` resolve a
//! staged pending import, `status` shows it, and `results` prints a
//! persisted import log.

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{open_workspace, print_table};
use crate::cli::GlobalOpts;
use crate::core::{Config, Workspace};
use crate::db::Database;
use crate::import::analyze::{analyze, NewModel};
use crate::import::commit::{commit_rows, RowOutcome, RowResult};
use crate::import::fields::FieldDef;
use crate::import::parser::RowReader;
use crate::import::pending::{file_digest, PendingImport};
use crate::import::report::{latest_log, log_path, new_run_id, persist_log, ImportSummary};
use crate::import::{template, EntityKind, ImportError};

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Generate a CSV template for an entity type
    Template(TemplateArgs),

    /// Parse a CSV file, stage new master data, and commit
    Run(RunArgs),

    /// Commit the staged pending import
    Confirm,

    /// Discard the staged pending import
    Cancel,

    /// Show the staged pending import
    Status,

    /// Show a persisted import result log
    Results(ResultsArgs),
}

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Entity type (assets, contracts, providers)
    #[arg(value_parser = parse_entity_kind)]
    pub entity: EntityKind,

    /// Asset type whose custom fields become template columns
    #[arg(long = "type")]
    pub asset_type: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Entity type (assets, contracts, providers)
    #[arg(value_parser = parse_entity_kind)]
    pub entity: EntityKind,

    /// CSV file to import (semicolon-delimited, .csv extension)
    pub file: PathBuf,

    /// Asset type to import assets into
    #[arg(long = "type")]
    pub asset_type: Option<String>,

    /// Accept new manufacturer/model pairs without prompting
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResultsArgs {
    /// Run id to show (default: the most recent run)
    #[arg(long)]
    pub run: Option<String>,
}

fn parse_entity_kind(s: &str) -> Result<EntityKind, String> {
    s.parse()
}

pub fn run(cmd: ImportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ImportCommands::Template(args) => run_template(args, global),
        ImportCommands::Run(args) => run_import(args, global),
        ImportCommands::Confirm => run_confirm(global),
        ImportCommands::Cancel => run_cancel(global),
        ImportCommands::Status => run_status(global),
        ImportCommands::Results(args) => run_results(args, global),
    }
}

/// Resolve the asset type and its schema snapshot for an import run.
/// Fixed-schema entities have no asset type and an empty schema.
fn resolve_schema(
    db: &Database,
    entity: EntityKind,
    asset_type: Option<&str>,
) -> Result<(Option<i64>, Option<String>, Vec<FieldDef>)> {
    if entity != EntityKind::Assets {
        return Ok((None, None, Vec::new()));
    }
    let name = asset_type.ok_or_else(|| miette::miette!("{}", ImportError::AssetTypeRequired))?;
    let type_id = db
        .find_asset_type(name)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("{}", ImportError::UnknownAssetType(name.to_string())))?;
    let schema = db
        .list_field_defs(type_id)
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((Some(type_id), Some(name.to_string()), schema))
}

fn run_template(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    let (_, _, schema) = resolve_schema(&db, args.entity, args.asset_type.as_deref())?;
    let csv = template::generate(args.entity, &schema).map_err(|e| miette::miette!("{}", e))?;

    // Template to stdout (can be redirected to file); hint to stderr
    print!("{}", csv);
    eprintln!(
        "{} Template generated. Redirect to file: rkl import template {} > {}.csv",
        style("→").blue(),
        args.entity,
        args.entity
    );

    Ok(())
}

fn run_import(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(Some(&workspace));

    // One pending import per workspace; never silently overwrite it
    if PendingImport::exists(&workspace) {
        return Err(miette::miette!("{}", ImportError::PendingExists));
    }

    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }

    let (asset_type_id, asset_type_name, schema) =
        resolve_schema(&db, args.entity, args.asset_type.as_deref())?;

    // Schema is snapshotted here; a concurrent definition edit cannot
    // change behavior mid-batch
    let reader = RowReader::open(&args.file, args.entity, schema)
        .map_err(|e| miette::miette!("{}", e))?;
    let rows = reader.collect_rows();

    println!(
        "{} Importing {} from {} ({} row(s))",
        style("→").blue(),
        style(args.entity).cyan(),
        style(args.file.display()).yellow(),
        rows.len()
    );

    let digest = file_digest(&args.file).map_err(|e| miette::miette!("{}", e))?;
    let new_models = analyze(&db, &rows).map_err(|e| miette::miette!("{}", e))?;
    let run_id = new_run_id();

    // Fast path: nothing to confirm
    if new_models.is_empty() {
        let results = commit_rows(&db, &config.actor(), asset_type_id, &rows)
            .map_err(|e| miette::miette!("{}", e))?;
        return finish_run(&workspace, global, run_id, &args.file, digest, results);
    }

    println!();
    println!(
        "{} {} new manufacturer/model pair(s) referenced by this file:",
        style("!").yellow(),
        new_models.len()
    );
    print_table(
        ["Manufacturer", "Model"],
        new_models
            .iter()
            .map(|m| vec![m.manufacturer.clone(), m.model.clone()])
            .collect::<Vec<_>>(),
    );

    let accepted = if args.yes {
        true
    } else if console::user_attended() {
        dialoguer::Confirm::new()
            .with_prompt("Create these and continue the import?")
            .default(false)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?
    } else {
        // Non-interactive: stage the pending import for a later decision
        let pending = PendingImport {
            run_id,
            entity: args.entity,
            asset_type_id,
            asset_type_name,
            source_file: args.file.canonicalize().unwrap_or(args.file.clone()),
            file_sha256: digest,
            created: chrono::Utc::now(),
            new_models,
            rows,
        };
        pending.save(&workspace).map_err(|e| miette::miette!("{}", e))?;
        println!(
            "{} Import staged. Run {} to commit or {} to discard.",
            style("→").blue(),
            style("rkl import confirm").cyan(),
            style("rkl import cancel").cyan()
        );
        return Ok(());
    };

    if !accepted {
        println!("{}", style("Import cancelled; nothing was written.").yellow());
        return Ok(());
    }

    create_models(&db, &new_models)?;
    let results = commit_rows(&db, &config.actor(), asset_type_id, &rows)
        .map_err(|e| miette::miette!("{}", e))?;
    finish_run(&workspace, global, run_id, &args.file, digest, results)
}

fn run_confirm(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(Some(&workspace));

    let pending = PendingImport::load(&workspace).map_err(|e| miette::miette!("{}", e))?;
    pending.verify_digest().map_err(|e| miette::miette!("{}", e))?;

    create_models(&db, &pending.new_models)?;
    let results = commit_rows(&db, &config.actor(), pending.asset_type_id, &pending.rows)
        .map_err(|e| miette::miette!("{}", e))?;

    PendingImport::clear(&workspace).map_err(|e| miette::miette!("{}", e))?;

    finish_run(
        &workspace,
        global,
        pending.run_id,
        &pending.source_file,
        pending.file_sha256,
        results,
    )
}

fn run_cancel(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    PendingImport::clear(&workspace).map_err(|e| miette::miette!("{}", e))?;
    println!(
        "{} Pending import cancelled; nothing was written.",
        style("✓").green()
    );
    Ok(())
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    if !PendingImport::exists(&workspace) {
        println!("{}", style("No pending import.").yellow());
        return Ok(());
    }

    let pending = PendingImport::load(&workspace).map_err(|e| miette::miette!("{}", e))?;
    println!("{}", style("Pending import").bold());
    println!("  run:     {}", pending.run_id);
    println!("  entity:  {}", pending.entity);
    if let Some(name) = &pending.asset_type_name {
        println!("  type:    {}", name);
    }
    println!("  file:    {}", pending.source_file.display());
    println!("  staged:  {} row(s)", pending.rows.len());
    println!("  created: {}", pending.created.to_rfc3339());
    println!();
    println!("New manufacturer/model pairs awaiting confirmation:");
    print_table(
        ["Manufacturer", "Model"],
        pending
            .new_models
            .iter()
            .map(|m| vec![m.manufacturer.clone(), m.model.clone()])
            .collect::<Vec<_>>(),
    );
    Ok(())
}

fn run_results(args: ResultsArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;

    let path = match args.run {
        Some(run_id) => {
            let path = log_path(&workspace, &run_id);
            if !path.exists() {
                return Err(miette::miette!("no import log for run '{}'", run_id));
            }
            path
        }
        None => match latest_log(&workspace) {
            Some(path) => path,
            None => {
                println!("{}", style("No import logs yet.").yellow());
                return Ok(());
            }
        },
    };

    let contents =
        std::fs::read_to_string(&path).map_err(|e| miette::miette!("{}: {}", path.display(), e))?;
    print!("{}", contents);
    Ok(())
}

/// Create the confirmed manufacturer/model pairs (idempotent)
fn create_models(db: &Database, new_models: &[NewModel]) -> Result<()> {
    for entry in new_models {
        let manufacturer_id = db
            .find_or_create_manufacturer(&entry.manufacturer)
            .map_err(|e| miette::miette!("{}", e))?;
        db.find_or_create_model(manufacturer_id, &entry.model)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    Ok(())
}

/// Print per-row outcomes and the summary block, then persist the log
fn finish_run(
    workspace: &Workspace,
    global: &GlobalOpts,
    run_id: String,
    source_file: &std::path::Path,
    file_sha256: String,
    results: Vec<RowResult>,
) -> Result<()> {
    let summary = ImportSummary::from_results(
        run_id,
        source_file.to_path_buf(),
        file_sha256,
        results,
    );

    if !global.quiet {
        println!();
        for result in &summary.results {
            match &result.outcome {
                RowOutcome::Created => println!(
                    "{} Row {}: created",
                    style("✓").green(),
                    result.line
                ),
                RowOutcome::Updated => println!(
                    "{} Row {}: updated",
                    style("✓").yellow(),
                    result.line
                ),
                RowOutcome::Error(message) => println!(
                    "{} Row {}: {}",
                    style("✗").red(),
                    result.line,
                    message
                ),
            }
        }
    }

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed: {}", style(summary.total).cyan());
    println!("  Created:        {}", style(summary.created).green());
    if summary.updated > 0 {
        println!("  Updated:        {}", style(summary.updated).yellow());
    }
    if summary.failed > 0 {
        println!("  Errors:         {}", style(summary.failed).red());
    }

    // Log persistence failure is a warning; committed rows stay committed
    match persist_log(workspace, &summary) {
        Ok(path) => println!("  Log:            {}", style(path.display()).dim()),
        Err(e) => eprintln!(
            "{} could not write import log: {}",
            style("⚠").yellow(),
            e
        ),
    }

    Ok(())
}
