// ABOUTME: Integration tests for rollback resolution and execution.
// ABOUTME: Covers each target kind, dry-run purity, and every rejection path.

mod support;

use stagecraft::deploy::{
    RollbackError, RollbackOutcome, RollbackTarget, deploy_release, rollback_release,
};
use stagecraft::diagnostics::Diagnostics;
use stagecraft::plan::{Plan, Planner};
use stagecraft::state::{Phase, Release, ReleaseStore};
use stagecraft::types::ReleaseId;
use support::{RecordingPhases, full_config};
use tokio_util::sync::CancellationToken;

struct Fixture {
    _dir: tempfile::TempDir,
    store: ReleaseStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = ReleaseStore::new(dir.path().join("releases.json"));
        Self { _dir: dir, store }
    }

    fn plan(&self, env: &str) -> Plan {
        Planner::new(&full_config()).plan_deploy(env).unwrap()
    }

    async fn deploy(&self, env: &str, version: &str) -> Release {
        deploy_release(
            &self.store,
            &RecordingPhases::new(),
            &self.plan(env),
            version,
            &format!("sha-{version}"),
            &CancellationToken::new(),
            &mut Diagnostics::default(),
        )
        .await
        .unwrap()
    }

    async fn deploy_failing(&self, env: &str, version: &str, phase: Phase) -> Release {
        deploy_release(
            &self.store,
            &RecordingPhases::failing_at(phase),
            &self.plan(env),
            version,
            "",
            &CancellationToken::new(),
            &mut Diagnostics::default(),
        )
        .await
        .unwrap_err();
        self.store.current_release(env).unwrap()
    }

    async fn rollback(
        &self,
        env: &str,
        target: RollbackTarget,
        dry_run: bool,
    ) -> Result<RollbackOutcome, RollbackError> {
        rollback_release(
            &self.store,
            &RecordingPhases::new(),
            &self.plan(env),
            &target,
            dry_run,
            &CancellationToken::new(),
            &mut Diagnostics::default(),
        )
        .await
    }
}

#[tokio::test]
async fn to_previous_creates_a_release_with_the_old_version() {
    support::init_tracing();
    let fx = Fixture::new();
    let v1 = fx.deploy("staging", "1.0.0").await;
    let v2 = fx.deploy("staging", "2.0.0").await;

    let outcome = fx
        .rollback("staging", RollbackTarget::Previous, false)
        .await
        .unwrap();

    let RollbackOutcome::Executed { target, release } = outcome else {
        panic!("expected an executed rollback");
    };
    assert_eq!(target.id, v1.id);
    assert_eq!(release.version, "1.0.0");
    assert_eq!(release.commit_sha, "sha-1.0.0");
    assert_eq!(release.previous_id.as_ref(), Some(&v2.id));
    assert!(release.is_fully_deployed());
    assert_ne!(release.id, v1.id);

    assert_eq!(fx.store.current_release("staging").unwrap().id, release.id);
    assert_eq!(fx.store.list_releases("staging").unwrap().len(), 3);
}

#[tokio::test]
async fn to_release_and_to_version_pick_the_right_target() {
    let fx = Fixture::new();
    let v1 = fx.deploy("staging", "1.0.0").await;
    fx.deploy("staging", "2.0.0").await;
    fx.deploy("staging", "3.0.0").await;

    let outcome = fx
        .rollback("staging", RollbackTarget::Release(v1.id.clone()), true)
        .await
        .unwrap();
    assert!(matches!(outcome, RollbackOutcome::DryRun { target, .. } if target.id == v1.id));

    let outcome = fx
        .rollback("staging", RollbackTarget::Version("2.0.0".into()), false)
        .await
        .unwrap();
    let RollbackOutcome::Executed { release, .. } = outcome else {
        panic!("expected an executed rollback");
    };
    assert_eq!(release.version, "2.0.0");
}

#[tokio::test]
async fn dry_run_never_writes() {
    let fx = Fixture::new();
    fx.deploy("staging", "1.0.0").await;
    let current = fx.deploy("staging", "2.0.0").await;
    let before = fx.store.list_releases("staging").unwrap();

    let outcome = fx
        .rollback("staging", RollbackTarget::Previous, true)
        .await
        .unwrap();

    let RollbackOutcome::DryRun {
        current: reported,
        target,
    } = outcome
    else {
        panic!("expected a dry run");
    };
    assert_eq!(reported.id, current.id);
    assert_eq!(target.version, "1.0.0");
    assert_eq!(fx.store.list_releases("staging").unwrap(), before);
}

#[tokio::test]
async fn unknown_version_is_rejected() {
    let fx = Fixture::new();
    fx.deploy("staging", "1.0.0").await;
    fx.deploy("prod", "9.9.9").await;
    let before = fx.store.list_releases("staging").unwrap();

    let err = fx
        .rollback("staging", RollbackTarget::Version("9.9.9".into()), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "no_matching_version");
    assert_eq!(fx.store.list_releases("staging").unwrap(), before);
}

#[tokio::test]
async fn release_from_another_environment_is_rejected() {
    let fx = Fixture::new();
    let prod = fx.deploy("prod", "1.0.0").await;
    fx.deploy("staging", "1.0.0").await;

    let err = fx
        .rollback("staging", RollbackTarget::Release(prod.id.clone()), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "environment_mismatch");
    assert!(err.to_string().contains("belongs to environment \"prod\""));
}

#[tokio::test]
async fn current_release_is_not_a_valid_target() {
    let fx = Fixture::new();
    fx.deploy("staging", "1.0.0").await;
    let current = fx.deploy("staging", "2.0.0").await;

    let err = fx
        .rollback("staging", RollbackTarget::Release(current.id.clone()), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cannot_rollback_to_current");

    let err = fx
        .rollback("staging", RollbackTarget::Version("2.0.0".into()), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cannot_rollback_to_current");
}

#[tokio::test]
async fn partially_deployed_target_is_rejected() {
    let fx = Fixture::new();
    let broken = fx.deploy_failing("staging", "1.0.0", Phase::Rollout).await;
    fx.deploy("staging", "2.0.0").await;

    let err = fx
        .rollback("staging", RollbackTarget::Previous, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "target_not_fully_deployed");
    match err {
        RollbackError::TargetNotFullyDeployed { id, phases } => {
            assert_eq!(id, broken.id.as_str());
            assert_eq!(
                phases,
                [Phase::Rollout, Phase::MigratePost, Phase::Finalize]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.store.list_releases("staging").unwrap().len(), 2);
}

#[tokio::test]
async fn first_release_has_no_previous() {
    let fx = Fixture::new();
    fx.deploy("staging", "1.0.0").await;

    let err = fx
        .rollback("staging", RollbackTarget::Previous, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "no_previous_release");
}

#[tokio::test]
async fn environment_without_releases_is_not_found() {
    let fx = Fixture::new();

    let err = fx
        .rollback("staging", RollbackTarget::Previous, true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(fx.store.list_all_releases().unwrap().is_empty());
}

#[tokio::test]
async fn missing_release_id_is_target_not_found() {
    let fx = Fixture::new();
    fx.deploy("staging", "1.0.0").await;

    let err = fx
        .rollback(
            "staging",
            RollbackTarget::Release(ReleaseId::new("rel-19700101-000000000")),
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "target_not_found");
}
