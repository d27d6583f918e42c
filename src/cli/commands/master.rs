//! `rkl master` command - Master data management
//!
//! Thin editors over the name-keyed tables the import pipeline resolves
//! foreign keys against.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::helpers::{open_workspace, print_table};
use crate::cli::GlobalOpts;
use crate::db::{Database, MasterKind};

#[derive(Subcommand, Debug)]
pub enum MasterCommands {
    /// Add a master data entry
    Add(MasterAddArgs),

    /// List master data entries
    List(MasterListArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MasterKindArg {
    Status,
    Location,
    Department,
    Provider,
    AcquisitionFormat,
    Manufacturer,
    Model,
}

#[derive(clap::Args, Debug)]
pub struct MasterAddArgs {
    /// Kind of master data
    #[arg(value_enum)]
    pub kind: MasterKindArg,

    /// Entry name
    pub name: String,

    /// Owning manufacturer (model entries only)
    #[arg(long)]
    pub manufacturer: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct MasterListArgs {
    /// Kind of master data
    #[arg(value_enum)]
    pub kind: MasterKindArg,
}

fn simple_kind(kind: MasterKindArg) -> Option<MasterKind> {
    match kind {
        MasterKindArg::Status => Some(MasterKind::Status),
        MasterKindArg::Location => Some(MasterKind::Location),
        MasterKindArg::Department => Some(MasterKind::Department),
        MasterKindArg::Provider => Some(MasterKind::Provider),
        MasterKindArg::AcquisitionFormat => Some(MasterKind::AcquisitionFormat),
        MasterKindArg::Manufacturer | MasterKindArg::Model => None,
    }
}

pub fn run(cmd: MasterCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    match cmd {
        MasterCommands::Add(args) => add(&db, args),
        MasterCommands::List(args) => list(&db, args),
    }
}

fn add(db: &Database, args: MasterAddArgs) -> Result<()> {
    match args.kind {
        MasterKindArg::Manufacturer => {
            db.find_or_create_manufacturer(&args.name)
                .map_err(|e| miette::miette!("{}", e))?;
        }
        MasterKindArg::Model => {
            let manufacturer = args.manufacturer.ok_or_else(|| {
                miette::miette!("model entries need --manufacturer")
            })?;
            let manufacturer_id = db
                .find_or_create_manufacturer(&manufacturer)
                .map_err(|e| miette::miette!("{}", e))?;
            db.find_or_create_model(manufacturer_id, &args.name)
                .map_err(|e| miette::miette!("{}", e))?;
        }
        _ => {
            let kind = simple_kind(args.kind).ok_or_else(|| miette::miette!("unreachable"))?;
            if db
                .find_named_id(kind, &args.name)
                .map_err(|e| miette::miette!("{}", e))?
                .is_some()
            {
                return Err(miette::miette!(
                    "{} '{}' already exists",
                    kind.column(),
                    args.name
                ));
            }
            db.create_named(kind, &args.name)
                .map_err(|e| miette::miette!("{}", e))?;
        }
    }

    println!("{} Added {}", style("✓").green(), style(&args.name).cyan());
    Ok(())
}

fn list(db: &Database, args: MasterListArgs) -> Result<()> {
    match args.kind {
        MasterKindArg::Manufacturer => {
            let entries = db
                .list_manufacturers()
                .map_err(|e| miette::miette!("{}", e))?;
            print_named(entries);
        }
        MasterKindArg::Model => {
            let entries = db.list_models().map_err(|e| miette::miette!("{}", e))?;
            if entries.is_empty() {
                println!("{}", style("No entries.").yellow());
                return Ok(());
            }
            let rows = entries
                .into_iter()
                .map(|(id, manufacturer, model)| vec![id.to_string(), manufacturer, model])
                .collect::<Vec<_>>();
            print_table(["ID", "Manufacturer", "Model"], rows);
        }
        _ => {
            let kind = simple_kind(args.kind).ok_or_else(|| miette::miette!("unreachable"))?;
            let entries = db.list_named(kind).map_err(|e| miette::miette!("{}", e))?;
            print_named(entries);
        }
    }
    Ok(())
}

fn print_named(entries: Vec<(i64, String)>) {
    if entries.is_empty() {
        println!("{}", style("No entries.").yellow());
        return;
    }
    let rows = entries
        .into_iter()
        .map(|(id, name)| vec![id.to_string(), name])
        .collect::<Vec<_>>();
    print_table(["ID", "Name"], rows);
}
