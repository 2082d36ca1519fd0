// ABOUTME: Command module aggregator for the stagecraft CLI.
// ABOUTME: Resolves config, environment, and state file once, then dispatches to handlers.

mod bootstrap;
mod deploy;
mod init;
mod plan;
mod releases;
mod rollback;

use std::env;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands, ReleasesCommand};
use stagecraft::config::Config;
use stagecraft::error::{Error, Result};
use stagecraft::output::Output;
use stagecraft::state::ReleaseStore;

/// Flags shared by every command.
pub struct Context {
    config_path: Option<PathBuf>,
    env: Option<String>,
    state_file: Option<PathBuf>,
    pub dry_run: bool,
    pub cancel: CancellationToken,
}

impl Context {
    /// Load the config from `--config`, or discover it in the current directory.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config_path {
            Some(path) => Config::load(path),
            None => Config::discover(&env::current_dir()?),
        }
    }

    /// Directory holding the config file; hooks and state live under it.
    pub fn project_dir(&self, config: &Config) -> Result<PathBuf> {
        match config.path.as_deref().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
            _ => Ok(env::current_dir()?),
        }
    }

    pub fn store(&self, project_dir: &Path) -> ReleaseStore {
        match &self.state_file {
            Some(path) => ReleaseStore::new(path),
            None => ReleaseStore::for_project(project_dir),
        }
    }

    /// The `--env` value; required by environment-scoped commands.
    pub fn environment(&self) -> Result<&str> {
        self.env
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::UserInput("--env is required for this command".to_string()))
    }

    pub fn environment_filter(&self) -> Option<&str> {
        self.environment().ok()
    }
}

pub async fn run(cli: Cli, output: &mut Output, cancel: CancellationToken) -> Result<()> {
    let cx = Context {
        config_path: cli.config,
        env: cli.env,
        state_file: cli.state_file,
        dry_run: cli.dry_run,
        cancel,
    };

    match cli.command {
        Commands::Init { project, force } => init::init(project.as_deref(), force, output),
        Commands::Plan {
            release_version,
            format,
        } => plan::plan(&cx, release_version.as_deref(), format, output),
        Commands::Deploy { release_version } => {
            deploy::deploy(&cx, release_version.as_deref(), output).await
        }
        Commands::Rollback {
            to_previous,
            to_release,
            to_version,
        } => {
            rollback::rollback(
                &cx,
                to_previous,
                to_release.as_deref(),
                to_version.as_deref(),
                output,
            )
            .await
        }
        Commands::Releases { command } => match command {
            ReleasesCommand::List => releases::list(&cx, output),
            ReleasesCommand::Show { id } => releases::show(&cx, &id, output),
        },
        Commands::Bootstrap { hosts } => bootstrap::bootstrap(&cx, &hosts, output).await,
    }
}

/// Print collected warnings through the output.
pub fn emit_warnings(diag: &stagecraft::diagnostics::Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
