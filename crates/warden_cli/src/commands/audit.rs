//! Inspect, verify, and export the audit ledger.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use warden_audit::AuditLedger;

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// Recompute the hash chain end-to-end
    Verify {
        /// Ledger file (JSONL)
        #[arg(long, default_value = "./warden-state/ledger.jsonl")]
        ledger: PathBuf,
    },
    /// Print the entries for one pipeline run
    Query {
        #[arg(long, default_value = "./warden-state/ledger.jsonl")]
        ledger: PathBuf,
        /// Correlation id of the run (e.g. run-1a2b3c4d)
        #[arg(long)]
        correlation_id: String,
        /// Only entries recorded by this actor
        #[arg(long)]
        actor: Option<String>,
        /// Most recent N entries only
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export a verifiable ledger segment as JSON
    Export {
        #[arg(long, default_value = "./warden-state/ledger.jsonl")]
        ledger: PathBuf,
        /// First sequence number (defaults to 0)
        #[arg(long)]
        from: Option<u64>,
        /// Last sequence number, inclusive (defaults to the end)
        #[arg(long)]
        to: Option<u64>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub async fn execute(args: AuditArgs) -> anyhow::Result<()> {
    match args.command {
        AuditCommand::Verify { ledger } => {
            let ledger = AuditLedger::open(&ledger)
                .with_context(|| format!("opening ledger {}", ledger.display()))?;
            ledger.verify()?;
            println!("Ledger OK: {} entries, chain verified", ledger.len()?);
        }
        AuditCommand::Query {
            ledger,
            correlation_id,
            actor,
            limit,
        } => {
            let ledger = AuditLedger::open(&ledger)?;
            let entries = ledger.query_filtered(&correlation_id, actor.as_deref(), limit)?;
            if entries.is_empty() {
                println!("No entries for {}", correlation_id);
                return Ok(());
            }
            for entry in entries {
                println!(
                    "#{:<4} {} {:<20} {:<18} decision={:<10} approvers=[{}]",
                    entry.sequence_number,
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.actor_id,
                    entry.decision.as_deref().unwrap_or("-"),
                    entry.approver_ids.join(", ")
                );
            }
        }
        AuditCommand::Export {
            ledger,
            from,
            to,
            output,
        } => {
            let ledger = AuditLedger::open(&ledger)?;
            let len = ledger.len()?;
            anyhow::ensure!(len > 0, "ledger is empty; nothing to export");

            let from = from.unwrap_or(0);
            let to = to.unwrap_or(len - 1);
            let segment = ledger.export(from, to)?;
            // Never hand out a segment that does not verify.
            segment.verify()?;

            let json = serde_json::to_string_pretty(&segment)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Exported entries {}..={} to {}",
                        from,
                        to,
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}
