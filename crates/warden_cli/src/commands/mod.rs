//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod audit;
pub mod config;
pub mod run;

/// PipeWarden - governed multi-agent software delivery pipeline.
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a pipeline with interactive approval gates
    Run(run::RunArgs),
    /// Inspect, verify, and export the audit ledger
    Audit(audit::AuditArgs),
    /// Validate or print configuration
    Config(config::ConfigArgs),
}
