//! `rkl asset` command - Read-only views over imported assets

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_workspace, print_table, truncate_str};
use crate::cli::GlobalOpts;
use crate::db::Database;

#[derive(Subcommand, Debug)]
pub enum AssetCommands {
    /// List assets
    List(AssetListArgs),

    /// Show one asset, including custom field values
    Show(AssetShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct AssetListArgs {
    /// Filter by asset type name
    #[arg(long = "type")]
    pub asset_type: Option<String>,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct AssetShowArgs {
    /// Asset ID
    pub id: i64,
}

pub fn run(cmd: AssetCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let db = Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    match cmd {
        AssetCommands::List(args) => {
            let asset_type_id = match &args.asset_type {
                Some(name) => Some(
                    db.find_asset_type(name)
                        .map_err(|e| miette::miette!("{}", e))?
                        .ok_or_else(|| miette::miette!("unknown asset type: '{}'", name))?,
                ),
                None => None,
            };

            let assets = db
                .list_assets(asset_type_id, args.limit)
                .map_err(|e| miette::miette!("{}", e))?;
            if assets.is_empty() {
                println!("{}", style("No assets found.").yellow());
                return Ok(());
            }

            let count = assets.len();
            let rows = assets
                .into_iter()
                .map(|a| {
                    vec![
                        a.id.to_string(),
                        truncate_str(&a.name, 30),
                        a.serial_number.unwrap_or_default(),
                        a.asset_type,
                        a.manufacturer.unwrap_or_default(),
                        a.model.unwrap_or_default(),
                        a.status.unwrap_or_default(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(
                ["ID", "Name", "Serial", "Type", "Manufacturer", "Model", "Status"],
                rows,
            );
            println!("{} asset(s)", count);
            Ok(())
        }
        AssetCommands::Show(args) => {
            let detail = db
                .get_asset_detail(args.id)
                .map_err(|e| miette::miette!("{}", e))?
                .ok_or_else(|| miette::miette!("no asset with id {}", args.id))?;

            println!("{} {}", style("Asset").bold(), style(args.id).cyan());
            println!("  name:               {}", detail.row.name);
            println!(
                "  serial number:      {}",
                detail.row.serial_number.unwrap_or_default()
            );
            println!("  type:               {}", detail.row.asset_type);
            println!(
                "  manufacturer:       {}",
                detail.row.manufacturer.unwrap_or_default()
            );
            println!("  model:              {}", detail.row.model.unwrap_or_default());
            println!("  status:             {}", detail.row.status.unwrap_or_default());
            println!("  location:           {}", detail.location.unwrap_or_default());
            println!("  department:         {}", detail.department.unwrap_or_default());
            println!("  provider:           {}", detail.provider.unwrap_or_default());
            println!(
                "  acquisition format: {}",
                detail.acquisition_format.unwrap_or_default()
            );
            println!(
                "  purchase date:      {}",
                detail.purchase_date.unwrap_or_default()
            );
            println!(
                "  purchase price:     {}",
                detail
                    .purchase_price
                    .map(|p| p.to_string())
                    .unwrap_or_default()
            );
            println!(
                "  description:        {}",
                detail.description.unwrap_or_default()
            );

            if !detail.custom_fields.is_empty() {
                println!();
                println!("{}", style("Custom fields").bold());
                for (name, value, unit) in detail.custom_fields {
                    match unit {
                        Some(unit) => println!("  {}: {} {}", name, value, unit),
                        None => println!("  {}: {}", name, value),
                    }
                }
            }
            Ok(())
        }
    }
}
