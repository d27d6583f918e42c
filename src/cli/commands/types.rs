//! `rkl type` command - Asset type management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_workspace, print_table};
use crate::cli::GlobalOpts;
use crate::db::Database;

#[derive(Subcommand, Debug)]
pub enum TypeCommands {
    /// Create a new asset type
    Add(TypeAddArgs),

    /// List asset types
    List,
}

#[derive(clap::Args, Debug)]
pub struct TypeAddArgs {
    /// Asset type name (e.g. Laptop, Switch, Printer)
    pub name: String,
}

pub fn run(cmd: TypeCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    match cmd {
        TypeCommands::Add(args) => {
            if db
                .find_asset_type(&args.name)
                .map_err(|e| miette::miette!("{}", e))?
                .is_some()
            {
                return Err(miette::miette!("asset type '{}' already exists", args.name));
            }
            db.create_asset_type(&args.name)
                .map_err(|e| miette::miette!("{}", e))?;
            println!(
                "{} Created asset type {}",
                style("✓").green(),
                style(&args.name).cyan()
            );
            Ok(())
        }
        TypeCommands::List => {
            let types = db.list_asset_types().map_err(|e| miette::miette!("{}", e))?;
            if types.is_empty() {
                println!("{}", style("No asset types defined yet.").yellow());
                return Ok(());
            }
            let rows = types
                .iter()
                .map(|(id, name)| {
                    let fields = db.list_field_defs(*id).map(|d| d.len()).unwrap_or(0);
                    vec![id.to_string(), name.clone(), fields.to_string()]
                })
                .collect::<Vec<_>>();
            print_table(["ID", "Name", "Fields"], rows);
            Ok(())
        }
    }
}
