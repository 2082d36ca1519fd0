// ABOUTME: Releases command implementation.
// ABOUTME: Read-only views of the release store: list and show.

use std::collections::HashMap;
use std::fmt::Write as _;

use stagecraft::error::Result;
use stagecraft::output::Output;
use stagecraft::state::{Phase, Release, ReleaseStore};

use super::Context;

fn status_label(release: &Release) -> &'static str {
    if release.is_fully_deployed() {
        "deployed"
    } else if release.has_failed() {
        "failed"
    } else {
        "incomplete"
    }
}

fn open_store(cx: &Context) -> Result<ReleaseStore> {
    let config = cx.load_config()?;
    let project_dir = cx.project_dir(&config)?;
    Ok(cx.store(&project_dir))
}

pub fn list(cx: &Context, output: &Output) -> Result<()> {
    let store = open_store(cx)?;
    let releases = match cx.environment_filter() {
        Some(env) => store.list_releases(env)?,
        None => store.list_all_releases()?,
    };

    let mut current: HashMap<&str, String> = HashMap::new();
    for release in &releases {
        if !current.contains_key(release.environment.as_str())
            && let Ok(cur) = store.current_release(&release.environment)
        {
            current.insert(release.environment.as_str(), cur.id.to_string());
        }
    }

    let mut text = String::new();
    if releases.is_empty() {
        text.push_str("No releases recorded\n");
    }
    for release in &releases {
        let marker = if current.get(release.environment.as_str()) == Some(&release.id.to_string()) {
            "*"
        } else {
            " "
        };
        let _ = writeln!(
            text,
            "{marker} {}  {}  {}  {}  {}",
            release.id,
            release.environment,
            release.version,
            release.created_at.format("%Y-%m-%d %H:%M:%S"),
            status_label(release)
        );
    }

    output.result("releases", &text, &releases);
    Ok(())
}

pub fn show(cx: &Context, id: &str, output: &Output) -> Result<()> {
    let store = open_store(cx)?;
    let release = store.get_release(id)?;

    let mut text = String::new();
    let _ = writeln!(text, "Release:     {}", release.id);
    let _ = writeln!(text, "Environment: {}", release.environment);
    let _ = writeln!(text, "Version:     {}", release.version);
    if !release.commit_sha.is_empty() {
        let _ = writeln!(text, "Commit:      {}", release.commit_sha);
    }
    let _ = writeln!(text, "Created:     {}", release.created_at.to_rfc3339());
    if let Some(prev) = &release.previous_id {
        let _ = writeln!(text, "Previous:    {prev}");
    }
    let _ = writeln!(text, "Status:      {}", status_label(&release));
    let _ = writeln!(text, "Phases:");
    for phase in Phase::ALL {
        let _ = writeln!(text, "  {:<13} {}", phase.as_str(), release.phase_status(phase));
    }

    output.result("release", &text, &release);
    Ok(())
}
