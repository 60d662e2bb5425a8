//! Validate or print configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use warden_core::WardenConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Load and validate a configuration file
    Check {
        /// Configuration file (YAML)
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the default configuration as YAML
    Default,
}

pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Check { config } => {
            let loaded = WardenConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            println!(
                "Configuration OK: {} planned stages, confidence threshold {}",
                loaded.plan.len(),
                loaded.confidence_threshold
            );
        }
        ConfigCommand::Default => {
            println!("{}", serde_yaml::to_string(&WardenConfig::default())?);
        }
    }
    Ok(())
}
