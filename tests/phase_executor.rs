// ABOUTME: Integration tests for deploying a release through its phases.
// ABOUTME: Covers success, phase failure, and cancellation between and during phases.

mod support;

use async_trait::async_trait;
use stagecraft::deploy::{ExecuteError, PhaseContext, PhaseError, PhaseFns, deploy_release};
use stagecraft::diagnostics::Diagnostics;
use stagecraft::plan::Planner;
use stagecraft::state::{Phase, PhaseStatus, ReleaseStore};
use support::{RecordingPhases, full_config};
use tokio_util::sync::CancellationToken;

fn store(dir: &tempfile::TempDir) -> ReleaseStore {
    ReleaseStore::new(dir.path().join("releases.json"))
}

#[tokio::test]
async fn successful_deploy_completes_every_phase() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let plan = Planner::new(&full_config()).plan_deploy("staging").unwrap();
    let phases = RecordingPhases::new();
    let mut diag = Diagnostics::default();

    let release = deploy_release(
        &store,
        &phases,
        &plan,
        "1.4.0",
        "deadbeef",
        &CancellationToken::new(),
        &mut diag,
    )
    .await
    .unwrap();

    assert_eq!(phases.phases(), Phase::ALL.to_vec());
    assert!(release.is_fully_deployed());
    assert_eq!(release.version, "1.4.0");
    assert_eq!(release.commit_sha, "deadbeef");
    assert_eq!(store.current_release("staging").unwrap(), release);
    assert!(!diag.has_warnings());

    // Every phase function saw the release being executed.
    assert!(
        phases
            .calls
            .lock()
            .iter()
            .all(|(_, id)| *id == release.id.as_str())
    );
}

#[tokio::test]
async fn failed_pre_deploy_migration_stops_the_release() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let plan = Planner::new(&full_config()).plan_deploy("staging").unwrap();
    let phases = RecordingPhases::failing_at(Phase::MigratePre);
    let mut diag = Diagnostics::default();

    let err = deploy_release(
        &store,
        &phases,
        &plan,
        "1.4.0",
        "",
        &CancellationToken::new(),
        &mut diag,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), "phase_failed");
    assert_eq!(err.phase(), Some(Phase::MigratePre));
    assert!(err.to_string().contains("migrate_pre failed"));
    assert_eq!(
        phases.phases(),
        [Phase::Build, Phase::Push, Phase::MigratePre]
    );

    let release = store.current_release("staging").unwrap();
    assert_eq!(release.phase_status(Phase::Build), PhaseStatus::Completed);
    assert_eq!(release.phase_status(Phase::Push), PhaseStatus::Completed);
    assert_eq!(release.phase_status(Phase::MigratePre), PhaseStatus::Failed);
    for phase in [Phase::Rollout, Phase::MigratePost, Phase::Finalize] {
        assert_eq!(release.phase_status(phase), PhaseStatus::Skipped);
    }
    assert!(release.has_failed());
}

#[tokio::test]
async fn cancellation_between_phases_skips_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let plan = Planner::new(&full_config()).plan_deploy("staging").unwrap();
    let cancel = CancellationToken::new();
    let phases = RecordingPhases::cancelling_after(Phase::Push, cancel.clone());
    let mut diag = Diagnostics::default();

    let err = deploy_release(&store, &phases, &plan, "1.4.0", "", &cancel, &mut diag)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExecuteError::Cancelled {
            phase: Phase::MigratePre,
            ..
        }
    ));
    assert_eq!(phases.phases(), [Phase::Build, Phase::Push]);

    let release = store.current_release("staging").unwrap();
    assert_eq!(release.phase_status(Phase::Push), PhaseStatus::Completed);
    for phase in [
        Phase::MigratePre,
        Phase::Rollout,
        Phase::MigratePost,
        Phase::Finalize,
    ] {
        assert_eq!(release.phase_status(phase), PhaseStatus::Skipped);
    }
}

/// Rollout cancels the run and then never finishes on its own.
struct HangingRollout;

#[async_trait]
impl PhaseFns for HangingRollout {
    async fn build(&self, _cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
    async fn push(&self, _cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
    async fn migrate_pre(&self, _cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
    async fn rollout(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        cx.cancel.cancel();
        std::future::pending::<()>().await;
        Ok(())
    }
    async fn migrate_post(&self, _cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
    async fn finalize(&self, _cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
}

#[tokio::test]
async fn cancellation_during_a_phase_fails_that_phase() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let plan = Planner::new(&full_config()).plan_deploy("prod").unwrap();
    let cancel = CancellationToken::new();
    let mut diag = Diagnostics::default();

    let err = deploy_release(&store, &HangingRollout, &plan, "2.0.0", "", &cancel, &mut diag)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "cancelled");
    assert_eq!(err.phase(), Some(Phase::Rollout));

    let release = store.current_release("prod").unwrap();
    assert_eq!(release.phase_status(Phase::MigratePre), PhaseStatus::Completed);
    assert_eq!(release.phase_status(Phase::Rollout), PhaseStatus::Failed);
    assert_eq!(release.phase_status(Phase::MigratePost), PhaseStatus::Skipped);
    assert_eq!(release.phase_status(Phase::Finalize), PhaseStatus::Skipped);
}

#[test]
fn planning_failure_creates_no_release() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let err = Planner::new(&full_config()).plan_deploy("qa").unwrap_err();
    assert_eq!(err.code(), "unknown_environment");
    assert!(store.list_all_releases().unwrap().is_empty());
    assert!(!store.path().exists());
}
