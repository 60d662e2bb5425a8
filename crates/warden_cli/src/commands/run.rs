//! Run a pipeline with interactive approval gates.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;

use warden_agents::{AgentInvoker, Scenario, ScriptedInvoker};
use warden_approval::{ApprovalGate, ApprovalRequest};
use warden_audit::AuditLedger;
use warden_core::{
    Collaborators, Environment, MemoryBackend, Orchestrator, PipelineRun, RunStatus, WardenConfig,
};

#[derive(Args)]
pub struct RunArgs {
    /// Task description for the pipeline
    #[arg(long)]
    pub task: String,

    /// Target environment: dev, staging, or prod
    #[arg(long, default_value = "dev")]
    pub env: String,

    /// YAML scenario with scripted agent reports (omit to echo tasks)
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Confidence reported by the echo invoker when no scenario is given
    #[arg(long, default_value_t = 0.9)]
    pub confidence: f64,

    /// Configuration file (YAML); defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Approve every gate automatically instead of prompting
    #[arg(long)]
    pub auto_approve: bool,

    /// Approver identity used for interactive approvals
    #[arg(long, default_value = "user")]
    pub approver: String,

    /// After a successful run, roll the environment back to this
    /// artifact version (goes through the same deploy approval policy)
    #[arg(long)]
    pub rollback_to: Option<String>,

    /// Reason recorded with the rollback
    #[arg(long, default_value = "manual rollback")]
    pub rollback_reason: String,
}

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let environment = parse_environment(&args.env)?;
    let config = match &args.config {
        Some(path) => WardenConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WardenConfig::default(),
    };

    let ledger = Arc::new(AuditLedger::open(&config.ledger_path)?);
    let gate = Arc::new(ApprovalGate::new());
    let invoker: Arc<dyn AgentInvoker> = match &args.scenario {
        Some(path) => Arc::new(ScriptedInvoker::new(
            Scenario::from_path(path)
                .with_context(|| format!("loading scenario from {}", path.display()))?,
        )),
        None => Arc::new(ScriptedInvoker::echo(args.confidence)),
    };
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = Orchestrator::new(
        config,
        ledger,
        gate,
        Collaborators::with_memory_backend(invoker, backend),
    )?;

    let mut run = orchestrator.submit(args.task.as_str(), environment)?;
    println!("Pipeline: {}", run.correlation_id);
    println!("Task:     {}", run.task);
    println!("Target:   {}", run.environment);
    println!();

    drive(&orchestrator, &mut run, args.auto_approve, &args.approver).await?;

    match run.status {
        RunStatus::Completed => print_summary(&run),
        RunStatus::Blocked => {
            report_blocked(&orchestrator, &run)?;
            bail!("pipeline {} blocked", run.correlation_id);
        }
        other => bail!("pipeline {} ended {}", run.correlation_id, other),
    }

    if let Some(version) = &args.rollback_to {
        println!();
        println!("Requesting rollback to {} ({})", version, args.rollback_reason);
        orchestrator
            .rollback(&mut run, version, &args.rollback_reason)
            .await?;
        drive(&orchestrator, &mut run, args.auto_approve, &args.approver).await?;
        match run.status {
            RunStatus::RolledBack => {
                println!("Rollback complete: {:?}", run.deployment_ids)
            }
            other => bail!("rollback ended {}", other),
        }
    }

    Ok(())
}

/// Advance the run, resolving approval gates interactively (or
/// automatically with `--auto-approve`) until it settles.
async fn drive(
    orchestrator: &Orchestrator,
    run: &mut PipelineRun,
    auto_approve: bool,
    approver: &str,
) -> anyhow::Result<()> {
    loop {
        orchestrator.advance(run).await?;
        if run.status != RunStatus::Running {
            return Ok(());
        }

        let pending = orchestrator.gate().pending();
        let Some(request) = pending.first() else {
            return Ok(());
        };

        if auto_approve {
            // Synthesize as many distinct identities as the gate needs.
            for i in 0..request.required_approvers.max(1) {
                orchestrator.gate().record_approval(
                    &request.id,
                    format!("{}-auto-{}", approver, i + 1),
                    Some("auto-approved".to_string()),
                )?;
            }
            println!("Auto-approved: {}", request.subject);
            continue;
        }

        match prompt_for_approval(request)? {
            PromptAnswer::Approve(comments) => {
                orchestrator
                    .gate()
                    .record_approval(&request.id, approver, comments)?;
                println!("Approved\n");
            }
            PromptAnswer::Reject(reason) => {
                orchestrator.gate().reject(&request.id, approver, reason)?;
                println!("Rejected\n");
            }
        }
    }
}

enum PromptAnswer {
    Approve(Option<String>),
    Reject(String),
}

/// Interactive [y/n/details] gate prompt.
fn prompt_for_approval(request: &ApprovalRequest) -> anyhow::Result<PromptAnswer> {
    println!("{}", "=".repeat(60));
    println!("APPROVAL REQUIRED");
    println!("{}", "=".repeat(60));
    println!("Kind:     {}", request.kind);
    println!("Subject:  {}", request.subject);
    println!(
        "Approvals: {}/{} (deadline {})",
        request.received.len(),
        request.required_approvers,
        request.deadline.format("%Y-%m-%d %H:%M UTC")
    );

    loop {
        print!("\nApprove? [y/n/details]: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;

        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => {
                print!("Comments (optional): ");
                std::io::stdout().flush()?;
                let mut comments = String::new();
                std::io::stdin().read_line(&mut comments)?;
                let comments = comments.trim();
                return Ok(PromptAnswer::Approve(if comments.is_empty() {
                    None
                } else {
                    Some(comments.to_string())
                }));
            }
            "n" | "no" => {
                print!("Reason for rejection: ");
                std::io::stdout().flush()?;
                let mut reason = String::new();
                std::io::stdin().read_line(&mut reason)?;
                return Ok(PromptAnswer::Reject(reason.trim().to_string()));
            }
            "d" | "details" => {
                println!("{}", serde_json::to_string_pretty(request)?);
            }
            _ => println!("Please enter 'y' to approve, 'n' to reject, or 'd' for details"),
        }
    }
}

fn print_summary(run: &PipelineRun) {
    println!("{}", "=".repeat(60));
    println!("PIPELINE COMPLETE");
    println!("{}", "=".repeat(60));
    println!("Pipeline ID: {}", run.correlation_id);
    if let Some(number) = run.build_number {
        println!("Build Number: {}", number);
    }
    if let Some(version) = &run.artifact_version {
        println!("Artifact Version: {}", version);
    }
    if let Some(digest) = &run.artifact_digest {
        println!("Artifact SHA-256: {}", digest);
    }
    if !run.deployment_ids.is_empty() {
        println!("Deployments: {:?}", run.deployment_ids);
    }
}

/// A blocked run is self-explanatory: print the findings that caused it
/// plus the full audit chain.
fn report_blocked(orchestrator: &Orchestrator, run: &PipelineRun) -> anyhow::Result<()> {
    println!("{}", "!".repeat(60));
    println!("PIPELINE BLOCKED");
    println!("{}", "!".repeat(60));

    if let Some(stage) = run.current_stage() {
        println!("Stage: {}", stage.stage);
        if let Some(decision) = &stage.decision {
            for finding in &decision.findings {
                println!(
                    "  [{}] {} ({}): {}",
                    finding.severity, finding.rule_id, finding.category, finding.message
                );
            }
        }
        if let Some(reason) = &stage.reason {
            println!("Reason: {}", reason);
        }
    }

    println!("\nAudit trail:");
    for entry in orchestrator.ledger().query(&run.correlation_id)? {
        println!(
            "  #{:<4} {} {:<20} {:<18} {}",
            entry.sequence_number,
            entry.timestamp.format("%H:%M:%S"),
            entry.action,
            entry.actor_id,
            entry.decision.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn parse_environment(s: &str) -> anyhow::Result<Environment> {
    match s.to_lowercase().as_str() {
        "dev" => Ok(Environment::Dev),
        "staging" => Ok(Environment::Staging),
        "prod" | "production" => Ok(Environment::Prod),
        other => bail!("unknown environment '{}'; expected dev, staging, or prod", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(parse_environment("dev").unwrap(), Environment::Dev);
        assert_eq!(parse_environment("PROD").unwrap(), Environment::Prod);
        assert!(parse_environment("qa").is_err());
    }
}
