// ABOUTME: Release execution and rollback workflows.
// ABOUTME: Both create a release record, then drive it through the shared phase executor.

mod error;
mod executor;
mod rollback;

pub use error::{ExecuteError, PhaseError, RollbackError};
pub use executor::{PhaseContext, PhaseExecutor, PhaseFns};
pub use rollback::{Resolver, RollbackTarget, validate_target};

use tokio_util::sync::CancellationToken;

use crate::diagnostics::Diagnostics;
use crate::plan::Plan;
use crate::state::{Release, ReleaseStore, StateError};

/// Create a release for `plan.environment` and run it through every phase.
///
/// The plan is computed by the caller; nothing is written if planning failed.
pub async fn deploy_release<F: PhaseFns + ?Sized>(
    store: &ReleaseStore,
    fns: &F,
    plan: &Plan,
    version: &str,
    commit_sha: &str,
    cancel: &CancellationToken,
    diagnostics: &mut Diagnostics,
) -> Result<Release, ExecuteError> {
    let release = store.create_release(&plan.environment, version, commit_sha)?;
    PhaseExecutor::new(store, fns)
        .execute(&release, plan, cancel, diagnostics)
        .await
}

/// Result of a rollback request.
#[derive(Debug)]
pub enum RollbackOutcome {
    /// Target resolved and validated; nothing was written.
    DryRun { current: Release, target: Release },
    /// A new release carrying the target's version was executed.
    Executed { target: Release, release: Release },
}

/// Roll `plan.environment` back to `target`.
///
/// With `dry_run` set the store is only read. Otherwise a new release with the
/// target's version and commit is created and executed like a deploy.
pub async fn rollback_release<F: PhaseFns + ?Sized>(
    store: &ReleaseStore,
    fns: &F,
    plan: &Plan,
    target: &RollbackTarget,
    dry_run: bool,
    cancel: &CancellationToken,
    diagnostics: &mut Diagnostics,
) -> Result<RollbackOutcome, RollbackError> {
    let env = plan.environment.as_str();
    let current = store.current_release(env).map_err(|e| match e {
        StateError::NoCurrentRelease(env) => RollbackError::NoCurrentRelease(env),
        other => RollbackError::State(other),
    })?;

    let resolved = Resolver::new(store).resolve(&current, target)?;
    tracing::info!(
        environment = env,
        current = %current.id,
        target = %resolved.id,
        version = %resolved.version,
        dry_run,
        "resolved rollback target"
    );

    if dry_run {
        return Ok(RollbackOutcome::DryRun {
            current,
            target: resolved,
        });
    }

    let release = store.create_release(env, &resolved.version, &resolved.commit_sha)?;
    let release = PhaseExecutor::new(store, fns)
        .execute(&release, plan, cancel, diagnostics)
        .await?;

    Ok(RollbackOutcome::Executed {
        target: resolved,
        release,
    })
}
