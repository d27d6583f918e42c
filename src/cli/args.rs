//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    asset::AssetCommands, audit::AuditArgs, completions::CompletionsArgs, field::FieldCommands,
    import::ImportCommands, init::InitArgs, master::MasterCommands, types::TypeCommands,
};

#[derive(Parser)]
#[command(name = "rkl")]
#[command(author, version, about = "Rackline CMDB toolkit")]
#[command(
    long_about = "A workspace-based configuration-management database for tracking IT assets and contracts, with a bulk CSV import pipeline."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress per-row progress output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Workspace root (default: auto-detect by finding .rackline/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rackline workspace
    Init(InitArgs),

    /// Asset type management
    #[command(subcommand)]
    Type(TypeCommands),

    /// Custom field definitions per asset type
    #[command(subcommand)]
    Field(FieldCommands),

    /// Master data (statuses, locations, manufacturers, ...)
    #[command(subcommand)]
    Master(MasterCommands),

    /// Imported assets
    #[command(subcommand)]
    Asset(AssetCommands),

    /// Bulk CSV import pipeline
    #[command(subcommand)]
    Import(ImportCommands),

    /// Show recent audit trail entries
    Audit(AuditArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}
