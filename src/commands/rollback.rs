// ABOUTME: Rollback command implementation.
// ABOUTME: Resolves the target release, then re-deploys its version as a new release.

use stagecraft::deploy::{RollbackOutcome, RollbackTarget, rollback_release};
use stagecraft::diagnostics::Diagnostics;
use stagecraft::error::Result;
use stagecraft::hooks::{HookPhases, HookRunner};
use stagecraft::output::Output;
use stagecraft::plan::Planner;

use super::{Context, emit_warnings};

pub async fn rollback(
    cx: &Context,
    to_previous: bool,
    to_release: Option<&str>,
    to_version: Option<&str>,
    output: &mut Output,
) -> Result<()> {
    let target = RollbackTarget::from_flags(to_previous, to_release, to_version)?;

    let config = cx.load_config()?;
    let env = cx.environment()?;
    let plan = Planner::new(&config).plan_deploy(env)?;

    let project_dir = cx.project_dir(&config)?;
    let store = cx.store(&project_dir);
    let phases = HookPhases::new(HookRunner::new(&project_dir));
    let mut diag = Diagnostics::default();

    output.start_timer();
    let result = rollback_release(
        &store,
        &phases,
        &plan,
        &target,
        cx.dry_run,
        &cx.cancel,
        &mut diag,
    )
    .await;
    emit_warnings(&diag, output);

    match result? {
        RollbackOutcome::DryRun { current, target } => {
            output.result(
                "rollback_plan",
                &format!(
                    "Would roll back {env} from {} ({}) to {} ({})",
                    current.id, current.version, target.id, target.version
                ),
                &target,
            );
            output.success("Dry run: no release created");
        }
        RollbackOutcome::Executed { target, release } => {
            output.result(
                "release",
                &format!("Release {} re-deployed {} from {}", release.id, release.version, target.id),
                &release,
            );
            output.success(&format!("Rolled back {env} to {}", target.version));
        }
    }
    Ok(())
}
