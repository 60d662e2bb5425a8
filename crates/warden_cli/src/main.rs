//! PipeWarden CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Policy/capability failure
//! - 4: Run blocked awaiting human action
//! - 5: Ledger integrity failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const POLICY_FAILURE: u8 = 3;
    pub const RUN_BLOCKED: u8 = 4;
    pub const LEDGER_INTEGRITY: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("warden=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Audit(args) => commands::audit::execute(args).await,
        Commands::Config(args) => commands::config::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let msg = e.to_string().to_lowercase();

    if msg.contains("integrity") || msg.contains("ledger") {
        ExitCodes::LEDGER_INTEGRITY
    } else if msg.contains("blocked") || msg.contains("rejected") || msg.contains("expired") {
        ExitCodes::RUN_BLOCKED
    } else if msg.contains("capability") || msg.contains("policy") {
        ExitCodes::POLICY_FAILURE
    } else if msg.contains("argument") || msg.contains("not found") || msg.contains("unknown") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
