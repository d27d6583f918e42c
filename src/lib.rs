//! Rackline: a workspace CMDB toolkit
//!
//! A command-line configuration-management database for tracking IT
//! assets and contracts, built around a bulk CSV import pipeline with
//! per-asset-type custom field schemas.

pub mod cli;
pub mod core;
pub mod db;
pub mod import;
