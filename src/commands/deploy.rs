// ABOUTME: Deploy command implementation.
// ABOUTME: Plans, creates a release, and drives it through the hook-backed phase functions.

use std::path::Path;
use tokio::process::Command;

use stagecraft::deploy::deploy_release;
use stagecraft::diagnostics::Diagnostics;
use stagecraft::error::Result;
use stagecraft::hooks::{HookPhases, HookRunner};
use stagecraft::output::Output;
use stagecraft::plan::{Planner, render_text};

use super::{Context, emit_warnings};

pub async fn deploy(cx: &Context, version: Option<&str>, output: &mut Output) -> Result<()> {
    let config = cx.load_config()?;
    let env = cx.environment()?;
    let plan = Planner::new(&config).plan_deploy(env)?;

    if cx.dry_run {
        output.result("plan", &render_text(&plan), &plan);
        output.success(&format!("Dry run: no release created for {env}"));
        return Ok(());
    }

    let project_dir = cx.project_dir(&config)?;
    let commit_sha = git_head(&project_dir).await.unwrap_or_default();
    let version = match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None if !commit_sha.is_empty() => commit_sha.clone(),
        None => "unknown".to_string(),
    };

    output.start_timer();
    output.progress(&format!(
        "Deploying {} version {version} to {env} ({} operations)",
        config.project.name,
        plan.operations.len()
    ));

    let store = cx.store(&project_dir);
    let phases = HookPhases::new(HookRunner::new(&project_dir));
    let mut diag = Diagnostics::default();

    let result = deploy_release(
        &store,
        &phases,
        &plan,
        &version,
        &commit_sha,
        &cx.cancel,
        &mut diag,
    )
    .await;
    emit_warnings(&diag, output);

    let release = result?;
    output.result("release", &format!("Release {} completed", release.id), &release);
    output.success(&format!("Deployed {version} to {env}"));
    Ok(())
}

/// `git rev-parse HEAD` in `dir`, if it is a git checkout.
async fn git_head(dir: &Path) -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .await
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}
