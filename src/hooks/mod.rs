// ABOUTME: Hooks system for release phases.
// ABOUTME: Runs .stagecraft/hooks/<phase> scripts as the CLI's phase functions; missing hooks are no-ops.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::MigrationStrategy;
use crate::deploy::{PhaseContext, PhaseError, PhaseFns};
use crate::plan::{Operation, OperationType, Plan};
use crate::state::{Phase, Release};

/// Plan operations a phase acts on, in plan order.
pub fn phase_operations(plan: &Plan, phase: Phase) -> Vec<&str> {
    match phase {
        Phase::Build | Phase::Push => ids(plan.operations_of(OperationType::Build)),
        Phase::MigratePre => ids(plan.migrations(MigrationStrategy::PreDeploy)),
        Phase::Rollout => ids(plan.operations_of(OperationType::Deploy)),
        Phase::MigratePost => ids(plan.migrations(MigrationStrategy::PostDeploy)),
        Phase::Finalize => ids(plan.operations_of(OperationType::HealthCheck)),
    }
}

fn ids<'a>(ops: impl Iterator<Item = &'a Operation>) -> Vec<&'a str> {
    ops.map(|op| op.id.as_str()).collect()
}

/// Context passed to hooks via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub environment: String,
    pub release_id: String,
    pub version: String,
    pub commit_sha: String,
    pub phase: Phase,
    pub previous_release_id: Option<String>,
    pub operations: Vec<String>,
}

impl HookContext {
    pub fn new(release: &Release, plan: &Plan, phase: Phase) -> Self {
        Self {
            environment: release.environment.clone(),
            release_id: release.id.to_string(),
            version: release.version.clone(),
            commit_sha: release.commit_sha.clone(),
            phase,
            previous_release_id: release.previous_id.as_ref().map(ToString::to_string),
            operations: phase_operations(plan, phase)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("STAGECRAFT_ENV".to_string(), self.environment.clone());
        env.insert("STAGECRAFT_RELEASE_ID".to_string(), self.release_id.clone());
        env.insert("STAGECRAFT_VERSION".to_string(), self.version.clone());
        env.insert("STAGECRAFT_COMMIT_SHA".to_string(), self.commit_sha.clone());
        env.insert("STAGECRAFT_PHASE".to_string(), self.phase.to_string());
        env.insert("STAGECRAFT_OPERATIONS".to_string(), self.operations.join(","));
        if let Some(ref prev) = self.previous_release_id {
            env.insert("STAGECRAFT_PREVIOUS_RELEASE_ID".to_string(), prev.clone());
        }
        env
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A hook ran and did not succeed.
#[derive(Debug, thiserror::Error)]
#[error("{phase} hook failed ({}): {}", exit_label(*.exit_code), .stderr.trim())]
pub struct HookFailed {
    pub phase: Phase,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

/// Discovers and runs hooks from a project directory.
#[derive(Debug, Clone)]
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    /// Create a new hook runner looking for hooks in the given project directory.
    pub fn new(project_dir: &Path) -> Self {
        Self {
            hooks_dir: project_dir.join(".stagecraft").join("hooks"),
        }
    }

    /// Check if a hook exists for the given phase.
    pub fn hook_exists(&self, phase: Phase) -> bool {
        self.hook_path(phase).is_file()
    }

    fn hook_path(&self, phase: Phase) -> PathBuf {
        self.hooks_dir.join(phase.as_str())
    }

    /// Run a hook if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    pub async fn run(&self, phase: Phase, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path(phase);

        if !hook_path.is_file() {
            tracing::debug!(%phase, "no hook, skipping");
            return None;
        }

        tracing::info!("Running {} hook: {}", phase, hook_path.display());

        let output = Command::new(&hook_path)
            .envs(context.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = HookResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if result.success {
                    tracing::info!("{} hook completed successfully", phase);
                } else {
                    tracing::warn!("{} hook failed with exit code {:?}", phase, result.exit_code);
                }

                Some(result)
            }
            Err(e) => {
                tracing::error!("Failed to execute {} hook: {}", phase, e);
                Some(HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

/// Phase functions backed by project hook scripts.
#[derive(Debug, Clone)]
pub struct HookPhases {
    runner: HookRunner,
}

impl HookPhases {
    pub fn new(runner: HookRunner) -> Self {
        Self { runner }
    }

    async fn run_phase(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        let context = HookContext::new(cx.release, cx.plan, cx.phase);
        match self.runner.run(cx.phase, &context).await {
            Some(result) if !result.success => Err(HookFailed {
                phase: cx.phase,
                exit_code: result.exit_code,
                stderr: result.stderr,
            }
            .into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PhaseFns for HookPhases {
    async fn build(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }

    async fn push(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }

    async fn migrate_pre(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }

    async fn rollout(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }

    async fn migrate_post(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }

    async fn finalize(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.run_phase(cx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::plan::Planner;
    use crate::types::ReleaseId;
    use chrono::Utc;

    fn release(previous: Option<&str>) -> Release {
        Release {
            id: ReleaseId::new("rel-20250101-120000000"),
            environment: "staging".to_string(),
            version: "v1.2.3".to_string(),
            commit_sha: "abc123".to_string(),
            created_at: Utc::now(),
            phases: Default::default(),
            previous_id: previous.map(ReleaseId::new),
        }
    }

    fn plan() -> Plan {
        let config = Config::from_yaml(
            r#"
project:
  name: shop
backend:
  provider: generic
databases:
  app:
    migrations:
      engine: raw
      path: migrations/app
      strategy: pre_deploy
environments:
  staging:
    driver: digitalocean
"#,
        )
        .unwrap();
        Planner::new(&config).plan_deploy("staging").unwrap()
    }

    #[test]
    fn hook_context_to_env() {
        let context = HookContext::new(&release(Some("rel-20241231-090000000")), &plan(), Phase::MigratePre);

        let env = context.to_env();
        assert_eq!(env.get("STAGECRAFT_ENV"), Some(&"staging".to_string()));
        assert_eq!(
            env.get("STAGECRAFT_RELEASE_ID"),
            Some(&"rel-20250101-120000000".to_string())
        );
        assert_eq!(env.get("STAGECRAFT_VERSION"), Some(&"v1.2.3".to_string()));
        assert_eq!(env.get("STAGECRAFT_COMMIT_SHA"), Some(&"abc123".to_string()));
        assert_eq!(env.get("STAGECRAFT_PHASE"), Some(&"migrate_pre".to_string()));
        assert_eq!(
            env.get("STAGECRAFT_OPERATIONS"),
            Some(&"migration_app_pre_deploy".to_string())
        );
        assert_eq!(
            env.get("STAGECRAFT_PREVIOUS_RELEASE_ID"),
            Some(&"rel-20241231-090000000".to_string())
        );
    }

    #[test]
    fn hook_context_without_previous_release() {
        let context = HookContext::new(&release(None), &plan(), Phase::Build);
        let env = context.to_env();
        assert!(!env.contains_key("STAGECRAFT_PREVIOUS_RELEASE_ID"));
        assert_eq!(env.get("STAGECRAFT_OPERATIONS"), Some(&"build_backend".to_string()));
    }

    #[test]
    fn phase_operations_follow_plan() {
        let plan = plan();
        assert_eq!(phase_operations(&plan, Phase::Rollout), ["deploy_staging"]);
        assert_eq!(phase_operations(&plan, Phase::Finalize), ["health_check_staging"]);
        assert!(phase_operations(&plan, Phase::MigratePost).is_empty());
    }

    #[test]
    fn hook_runner_checks_hooks_dir() {
        let runner = HookRunner::new(Path::new("/nonexistent"));
        assert!(!runner.hook_exists(Phase::Build));
    }
}
