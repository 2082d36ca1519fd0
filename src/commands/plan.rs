// ABOUTME: Plan command implementation.
// ABOUTME: Computes and prints the deployment plan without touching state.

use stagecraft::error::Result;
use stagecraft::output::{Output, OutputMode};
use stagecraft::plan::{Planner, render_json, render_text};

use super::Context;
use crate::cli::PlanFormat;

pub fn plan(cx: &Context, version: Option<&str>, format: PlanFormat, output: &Output) -> Result<()> {
    let config = cx.load_config()?;
    let env = cx.environment()?;

    let mut plan = Planner::new(&config).plan_deploy(env)?;
    if let Some(version) = version.map(str::trim).filter(|v| !v.is_empty()) {
        plan.metadata.insert("version".to_string(), version.into());
    }

    if format == PlanFormat::Json && output.mode() != OutputMode::Json {
        println!("{}", render_json(&plan)?);
        return Ok(());
    }

    output.result("plan", &render_text(&plan), &plan);
    Ok(())
}
