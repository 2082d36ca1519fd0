// ABOUTME: Init command implementation.
// ABOUTME: Writes a starter stagecraft.yml into the current directory.

use std::env;

use stagecraft::config::{CONFIG_FILENAME, init_config};
use stagecraft::error::Result;
use stagecraft::output::Output;

pub fn init(project: Option<&str>, force: bool, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    init_config(&cwd, project, force)?;
    output.success(&format!("Created {CONFIG_FILENAME}"));
    Ok(())
}
