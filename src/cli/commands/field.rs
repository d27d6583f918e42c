//! `rkl field` command - Custom field definition management
//!
//! Field definitions are the write side of the per-asset-type schema
//! registry: each definition becomes a column in future CSV templates
//! and drives value coercion during import.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_workspace, print_table};
use crate::cli::GlobalOpts;
use crate::db::Database;
use crate::import::fields::FieldType;

#[derive(Subcommand, Debug)]
pub enum FieldCommands {
    /// Add a field definition to an asset type
    Add(FieldAddArgs),

    /// List field definitions for an asset type
    List(FieldListArgs),

    /// Remove a field definition (its stored values go with it)
    Rm(FieldRmArgs),
}

#[derive(clap::Args, Debug)]
pub struct FieldAddArgs {
    /// Asset type the field belongs to
    pub asset_type: String,

    /// Field name (becomes a CSV template column)
    pub name: String,

    /// Data type: text, longtext, number, date, boolean, list
    #[arg(long = "type", value_parser = parse_field_type, default_value = "text")]
    pub data_type: FieldType,

    /// Reject rows where this field is empty
    #[arg(long)]
    pub required: bool,

    /// Allowed value for list fields (repeat for each option)
    #[arg(long = "option")]
    pub options: Vec<String>,

    /// Unit shown next to values (e.g. GB, kg)
    #[arg(long)]
    pub unit: Option<String>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct FieldListArgs {
    /// Asset type to list fields for
    pub asset_type: String,
}

#[derive(clap::Args, Debug)]
pub struct FieldRmArgs {
    /// Asset type the field belongs to
    pub asset_type: String,

    /// Field name to remove
    pub name: String,
}

fn parse_field_type(s: &str) -> Result<FieldType, String> {
    s.parse()
}

fn resolve_asset_type(db: &Database, name: &str) -> Result<i64> {
    db.find_asset_type(name)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("unknown asset type: '{}'", name))
}

pub fn run(cmd: FieldCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    match cmd {
        FieldCommands::Add(args) => {
            if args.data_type == FieldType::List && args.options.is_empty() {
                return Err(miette::miette!(
                    "list fields need at least one --option value"
                ));
            }
            if args.data_type != FieldType::List && !args.options.is_empty() {
                return Err(miette::miette!(
                    "--option is only valid for list fields"
                ));
            }

            let type_id = resolve_asset_type(&db, &args.asset_type)?;
            db.create_field_def(
                type_id,
                &args.name,
                args.data_type,
                args.required,
                &args.options,
                args.unit.as_deref(),
                args.description.as_deref(),
            )
            .map_err(|e| miette::miette!("{}", e))?;

            println!(
                "{} Added field {} ({}) to {}",
                style("✓").green(),
                style(&args.name).cyan(),
                args.data_type,
                style(&args.asset_type).cyan()
            );
            Ok(())
        }
        FieldCommands::List(args) => {
            let type_id = resolve_asset_type(&db, &args.asset_type)?;
            let defs = db
                .list_field_defs(type_id)
                .map_err(|e| miette::miette!("{}", e))?;
            if defs.is_empty() {
                println!(
                    "{}",
                    style(format!("No custom fields defined for {}.", args.asset_type)).yellow()
                );
                return Ok(());
            }
            let rows = defs
                .iter()
                .map(|d| {
                    vec![
                        d.name.clone(),
                        d.data_type.to_string(),
                        if d.required { "yes" } else { "" }.to_string(),
                        d.list_options.join(", "),
                        d.unit.clone().unwrap_or_default(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(["Name", "Type", "Required", "Options", "Unit"], rows);
            Ok(())
        }
        FieldCommands::Rm(args) => {
            let type_id = resolve_asset_type(&db, &args.asset_type)?;
            let removed = db
                .delete_field_def(type_id, &args.name)
                .map_err(|e| miette::miette!("{}", e))?;
            if !removed {
                return Err(miette::miette!(
                    "no field '{}' on asset type '{}'",
                    args.name,
                    args.asset_type
                ));
            }
            println!(
                "{} Removed field {} (stored values deleted)",
                style("✓").green(),
                style(&args.name).cyan()
            );
            Ok(())
        }
    }
}
