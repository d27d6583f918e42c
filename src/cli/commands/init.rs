//! `rkl init` command - Initialize a new rackline workspace

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::core::Workspace;
use crate::db::Database;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));

    let workspace = Workspace::init(&path).map_err(|e| miette::miette!("{}", e))?;
    Database::open(&workspace).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized rackline workspace at {}",
        style("✓").green(),
        style(workspace.root().display()).cyan()
    );
    println!();
    println!("Next steps:");
    println!("  rkl type add Laptop              # create an asset type");
    println!("  rkl field add Laptop ram_gb --type number");
    println!("  rkl import template assets --type Laptop > laptops.csv");

    Ok(())
}
