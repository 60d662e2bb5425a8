//! End-to-end pipeline scenarios against the in-memory backend.

use std::sync::Arc;

use mockall::mock;
use mockall::predicate::always;
use tempfile::TempDir;

use warden_agents::{
    AgentError, AgentInvocation, AgentInvoker, AgentReport, AgentResult, AgentRole, Scenario,
    ScriptedInvoker, ScriptedStep,
};
use warden_approval::{ApprovalGate, ApprovalKind, ApprovalStatus};
use warden_audit::{AuditAction, AuditLedger};
use warden_core::{
    Collaborators, Environment, MemoryBackend, Orchestrator, RunStatus, StageKind, StageStatus,
    WardenConfig,
};

mock! {
    pub Invoker {}

    #[async_trait::async_trait]
    impl AgentInvoker for Invoker {
        async fn invoke(&self, request: &AgentInvocation) -> AgentResult<AgentReport>;
    }
}

fn orchestrator_with(
    config: WardenConfig,
    invoker: Arc<dyn AgentInvoker>,
    tmp: &TempDir,
) -> (Orchestrator, Arc<MemoryBackend>) {
    let ledger = Arc::new(AuditLedger::open(tmp.path().join("ledger.jsonl")).unwrap());
    let gate = Arc::new(ApprovalGate::new());
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = Orchestrator::new(
        config,
        ledger,
        gate,
        Collaborators::with_memory_backend(invoker, backend.clone()),
    )
    .unwrap();
    (orchestrator, backend)
}

fn full_clean_scenario() -> Scenario {
    Scenario {
        name: "clean".to_string(),
        steps: vec![
            ScriptedStep::report(AgentRole::Design, "design document", 0.95),
            ScriptedStep::report(AgentRole::Dev, "implemented the change", 0.95),
            ScriptedStep::report(AgentRole::Test, "tests added and passing", 0.95),
            ScriptedStep::report(AgentRole::Cyber, "no findings", 0.95),
            ScriptedStep::report(AgentRole::Cicd, "build ready", 0.95),
            ScriptedStep::report(AgentRole::Cicd, "artifact ready", 0.95),
            ScriptedStep::report(AgentRole::Cicd, "deploy ready", 0.95),
        ],
    }
}

#[tokio::test]
async fn dev_stage_with_clean_output_advances_without_approval_request() {
    let tmp = TempDir::new().unwrap();
    let scenario = Scenario {
        name: "dev-then-test".to_string(),
        steps: vec![
            ScriptedStep::report(AgentRole::Dev, "clean implementation", 0.95),
            ScriptedStep::report(AgentRole::Test, "tests pass", 0.95),
        ],
    };
    let config = WardenConfig {
        plan: vec![StageKind::Dev, StageKind::Test],
        ..Default::default()
    };
    let (orchestrator, _) =
        orchestrator_with(config, Arc::new(ScriptedInvoker::new(scenario)), &tmp);

    let mut run = orchestrator.submit("small change", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    // The Dev stage advanced straight to Test: no approval request was
    // ever created for it.
    let dev_stage = &run.stages[0];
    assert_eq!(dev_stage.stage, StageKind::Dev);
    assert!(dev_stage.approval_request_id.is_none());
    assert!(orchestrator.gate().pending().is_empty());
}

#[tokio::test]
async fn cyber_critical_finding_blocks_and_nothing_auto_satisfies() {
    let tmp = TempDir::new().unwrap();
    let scenario = Scenario {
        name: "cyber-critical".to_string(),
        steps: vec![
            ScriptedStep::report(AgentRole::Dev, "impl", 0.95),
            ScriptedStep::report(
                AgentRole::Cyber,
                "leaked credential: password = \"prodsecret\"",
                0.95,
            ),
            // A later, clean rescan must not resurrect the run.
            ScriptedStep::report(AgentRole::Cyber, "rescan clean", 0.95),
        ],
    };
    let config = WardenConfig {
        plan: vec![StageKind::Dev, StageKind::Cyber],
        ..Default::default()
    };
    let (orchestrator, _) =
        orchestrator_with(config, Arc::new(ScriptedInvoker::new(scenario)), &tmp);

    let mut run = orchestrator.submit("risky change", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();

    assert_eq!(run.status, RunStatus::Blocked);
    assert!(orchestrator.gate().pending().is_empty());

    // Advancing again does not re-run anything or unblock.
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(run.status, RunStatus::Blocked);
    assert_eq!(
        run.stages.last().unwrap().status,
        StageStatus::Blocked
    );
}

#[tokio::test]
async fn prod_deploy_requires_dual_approval_even_after_cyber_passes() {
    let tmp = TempDir::new().unwrap();
    let (orchestrator, backend) = orchestrator_with(
        WardenConfig::default(),
        Arc::new(ScriptedInvoker::new(full_clean_scenario())),
        &tmp,
    );

    let mut run = orchestrator.submit("release v2", Environment::Prod).unwrap();
    orchestrator.advance(&mut run).await.unwrap();

    // Cyber passed, build and artifact delivered; the deploy gate holds.
    assert!(run
        .stages
        .iter()
        .any(|s| s.stage == StageKind::Cyber && s.status == StageStatus::Passed));
    assert!(run.artifact_version.is_some());
    let deploy = run.stages.last().unwrap();
    assert_eq!(deploy.stage, StageKind::Deploy);
    assert_eq!(deploy.status, StageStatus::AwaitingApproval);

    let request_id = deploy.approval_request_id.clone().unwrap();

    // One approval: still pending, no deploy call made.
    orchestrator
        .gate()
        .record_approval(&request_id, "alice", None)
        .unwrap();
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(
        orchestrator.gate().status(&request_id).unwrap(),
        ApprovalStatus::Pending
    );
    assert!(backend.current_version(Environment::Prod).is_none());

    // Second, distinct identity: gate satisfied, deploy performed.
    orchestrator
        .gate()
        .record_approval(&request_id, "bob", None)
        .unwrap();
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(backend.current_version(Environment::Prod).is_some());

    // The deployment entry carries both approver identities.
    let entries = orchestrator.ledger().query(&run.correlation_id).unwrap();
    let deployment = entries
        .iter()
        .find(|e| e.action == AuditAction::Deployment)
        .unwrap();
    assert_eq!(deployment.approver_ids, vec!["alice", "bob"]);
}

#[tokio::test]
async fn used_verbs_stay_inside_the_role_grant() {
    let tmp = TempDir::new().unwrap();
    let (orchestrator, _) = orchestrator_with(
        WardenConfig::default(),
        Arc::new(ScriptedInvoker::echo(0.95)),
        &tmp,
    );

    let mut run = orchestrator.submit("echo task", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    // The echo invoker reports exactly the allowed verbs; every stage
    // passed, so no reported verb ever escaped its role's grant.
    assert!(run.stages.iter().all(|s| s.status == StageStatus::Passed));
}

#[tokio::test]
async fn mocked_invoker_timeout_is_retried_then_succeeds() {
    let tmp = TempDir::new().unwrap();

    let mut mock = MockInvoker::new();
    let mut seq = mockall::Sequence::new();
    mock.expect_invoke()
        .with(always())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(AgentError::Timeout { seconds: 30 }));
    mock.expect_invoke()
        .with(always())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(AgentReport::new("design document", 0.95)));

    let config = WardenConfig {
        plan: vec![StageKind::Design],
        ..Default::default()
    };
    let (orchestrator, _) = orchestrator_with(config, Arc::new(mock), &tmp);

    let mut run = orchestrator.submit("task", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stages[0].attempt, 2);
}

#[tokio::test]
async fn ledger_replays_the_full_run_history_in_order() {
    let tmp = TempDir::new().unwrap();
    let (orchestrator, _) = orchestrator_with(
        WardenConfig::default(),
        Arc::new(ScriptedInvoker::new(full_clean_scenario())),
        &tmp,
    );

    let mut run = orchestrator.submit("audited task", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    orchestrator.ledger().verify().unwrap();
    let entries = orchestrator.ledger().query(&run.correlation_id).unwrap();

    // The history starts and ends where the run did.
    assert_eq!(entries.first().unwrap().action, AuditAction::RunStarted);
    assert_eq!(entries.last().unwrap().action, AuditAction::RunCompleted);

    // One policy decision per agent stage, recorded before the branch.
    let decisions = entries
        .iter()
        .filter(|e| e.action == AuditAction::PolicyDecision)
        .count();
    assert_eq!(decisions, 7);

    // Every stage start is present, so the in-memory run state is
    // derivable from the ledger alone.
    let starts = entries
        .iter()
        .filter(|e| e.action == AuditAction::StageStarted)
        .count();
    assert_eq!(starts, run.stages.len());
}

#[tokio::test]
async fn warn_gate_records_review_kind_and_approver() {
    let tmp = TempDir::new().unwrap();
    let scenario = Scenario {
        name: "warn".to_string(),
        steps: vec![ScriptedStep::report(
            AgentRole::Design,
            "draft - internal use only",
            0.95,
        )],
    };
    let config = WardenConfig {
        plan: vec![StageKind::Design],
        ..Default::default()
    };
    let (orchestrator, _) =
        orchestrator_with(config, Arc::new(ScriptedInvoker::new(scenario)), &tmp);

    let mut run = orchestrator.submit("draft doc", Environment::Dev).unwrap();
    orchestrator.advance(&mut run).await.unwrap();

    let pending = orchestrator.gate().pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, ApprovalKind::Review);

    orchestrator
        .gate()
        .record_approval(&pending[0].id, "reviewer-1", Some("acceptable".to_string()))
        .unwrap();
    orchestrator.advance(&mut run).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let entries = orchestrator.ledger().query(&run.correlation_id).unwrap();
    let resolved = entries
        .iter()
        .find(|e| e.action == AuditAction::ApprovalResolved)
        .unwrap();
    assert_eq!(resolved.approver_ids, vec!["reviewer-1"]);
}
