//! Delivery backends: build, artifact, and deployment collaborators.
//!
//! These are thin external interfaces; the orchestrator calls them only
//! after the corresponding approval request is satisfied. [`MemoryBackend`]
//! implements all three in memory for tests and demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::run::Environment;

/// Triggers CI builds.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Trigger a build and return its build number.
    async fn trigger_build(
        &self,
        job: &str,
        params: &HashMap<String, String>,
    ) -> CoreResult<u64>;
}

/// Stores versioned artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload an artifact and return its SHA-256 digest.
    async fn upload_artifact(&self, path: &str, repo: &str, version: &str) -> CoreResult<String>;
}

/// Deploys and rolls back artifact versions per environment.
#[async_trait]
pub trait DeployBackend: Send + Sync {
    async fn deploy(&self, env: Environment, version: &str) -> CoreResult<String>;

    async fn rollback(
        &self,
        env: Environment,
        version: &str,
        reason: &str,
    ) -> CoreResult<String>;
}

/// One deployment (or rollback) performed against an environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployment_id: String,
    pub version: String,
    pub at: DateTime<Utc>,
    /// Present only for rollbacks.
    #[serde(default)]
    pub rollback_reason: Option<String>,
}

#[derive(Debug, Clone)]
struct ArtifactRecord {
    path: String,
    digest: String,
}

/// In-memory implementation of all three backends.
///
/// Builds get monotonically increasing numbers, artifacts are kept in a
/// versioned catalog with SHA-256 digests, and deployment history is
/// tracked per environment so rollbacks can be validated against
/// previously uploaded versions.
#[derive(Default)]
pub struct MemoryBackend {
    build_counter: AtomicU64,
    deploy_counter: AtomicU64,
    artifacts: RwLock<HashMap<(String, String), ArtifactRecord>>,
    deployments: RwLock<HashMap<Environment, Vec<DeploymentRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a version was uploaded to any repository.
    pub fn has_version(&self, version: &str) -> bool {
        self.artifacts
            .read()
            .keys()
            .any(|(_, v)| v == version)
    }

    /// The currently deployed version in an environment.
    pub fn current_version(&self, env: Environment) -> Option<String> {
        self.deployments
            .read()
            .get(&env)
            .and_then(|history| history.last())
            .map(|record| record.version.clone())
    }

    /// Full deployment history for an environment, oldest first.
    pub fn history(&self, env: Environment) -> Vec<DeploymentRecord> {
        self.deployments
            .read()
            .get(&env)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl BuildBackend for MemoryBackend {
    async fn trigger_build(
        &self,
        job: &str,
        _params: &HashMap<String, String>,
    ) -> CoreResult<u64> {
        let number = self.build_counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(job, number, "Build triggered");
        Ok(number)
    }
}

#[async_trait]
impl ArtifactStore for MemoryBackend {
    async fn upload_artifact(&self, path: &str, repo: &str, version: &str) -> CoreResult<String> {
        let digest = warden_audit::sha256_hex(&format!("{}:{}:{}", repo, version, path));
        self.artifacts.write().insert(
            (repo.to_string(), version.to_string()),
            ArtifactRecord {
                path: path.to_string(),
                digest: digest.clone(),
            },
        );
        info!(repo, version, "Artifact uploaded");
        Ok(digest)
    }
}

#[async_trait]
impl DeployBackend for MemoryBackend {
    async fn deploy(&self, env: Environment, version: &str) -> CoreResult<String> {
        let n = self.deploy_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let deployment_id = format!("deploy-{}-{}", env, n);
        self.deployments
            .write()
            .entry(env)
            .or_default()
            .push(DeploymentRecord {
                deployment_id: deployment_id.clone(),
                version: version.to_string(),
                at: Utc::now(),
                rollback_reason: None,
            });
        info!(env = %env, version, deployment_id, "Deployed");
        Ok(deployment_id)
    }

    async fn rollback(
        &self,
        env: Environment,
        version: &str,
        reason: &str,
    ) -> CoreResult<String> {
        if !self.has_version(version) {
            return Err(CoreError::UnknownArtifact(version.to_string()));
        }
        let n = self.deploy_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let deployment_id = format!("deploy-{}-{}", env, n);
        self.deployments
            .write()
            .entry(env)
            .or_default()
            .push(DeploymentRecord {
                deployment_id: deployment_id.clone(),
                version: version.to_string(),
                at: Utc::now(),
                rollback_reason: Some(reason.to_string()),
            });
        info!(env = %env, version, reason, "Rolled back");
        Ok(deployment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_numbers_are_monotonic() {
        let backend = MemoryBackend::new();
        let params = HashMap::new();
        let a = backend.trigger_build("app-build", &params).await.unwrap();
        let b = backend.trigger_build("app-build", &params).await.unwrap();
        assert_eq!(b, a + 1);
    }

    #[tokio::test]
    async fn upload_records_version_with_digest() {
        let backend = MemoryBackend::new();
        let digest = backend
            .upload_artifact("app.tar.gz", "libs-release-local", "1.0.1")
            .await
            .unwrap();
        assert_eq!(digest.len(), 64);
        assert!(backend.has_version("1.0.1"));
        assert!(!backend.has_version("9.9.9"));
    }

    #[tokio::test]
    async fn deploy_tracks_current_version() {
        let backend = MemoryBackend::new();
        backend.deploy(Environment::Staging, "1.0.1").await.unwrap();
        backend.deploy(Environment::Staging, "1.0.2").await.unwrap();
        assert_eq!(
            backend.current_version(Environment::Staging).as_deref(),
            Some("1.0.2")
        );
        assert!(backend.current_version(Environment::Prod).is_none());
    }

    #[tokio::test]
    async fn rollback_requires_known_version() {
        let backend = MemoryBackend::new();
        let err = backend
            .rollback(Environment::Prod, "1.0.0", "bad release")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownArtifact(_)));

        backend
            .upload_artifact("app.tar.gz", "libs-release-local", "1.0.0")
            .await
            .unwrap();
        let id = backend
            .rollback(Environment::Prod, "1.0.0", "bad release")
            .await
            .unwrap();
        assert!(id.starts_with("deploy-prod-"));

        let history = backend.history(Environment::Prod);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rollback_reason.as_deref(), Some("bad release"));
    }
}
