//! CLI module for the approval engine
//!
//! Provides subcommands for operating the engine outside a host service:
//! - `sweep`: run one SLA sweep over a JSON fixture
//! - `entity-types`: print the supported entity-type catalog

pub mod entity_types;
pub mod sweep;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// HR approvals - multi-tenant approval workflow engine
#[derive(Parser)]
#[command(name = "hr-approvals")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a fixture into memory and run one SLA sweep
    Sweep(sweep::SweepArgs),

    /// List the entity types workflows can target
    EntityTypes,
}

/// Load `.env`, configuration and logging shared by every command
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}
