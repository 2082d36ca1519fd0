// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines global flags, all subcommands, and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagecraft")]
#[command(about = "Plan, deploy, and roll back releases; bootstrap hosts")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Target environment
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Path to the release state file
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results and errors as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Show what would happen without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stagecraft.yml configuration file
    Init {
        /// Project name (default: current directory name)
        #[arg(long)]
        project: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the deployment plan for an environment
    Plan {
        /// Version to record in the plan
        #[arg(long = "version")]
        release_version: Option<String>,

        /// Plan output format
        #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
        format: PlanFormat,
    },

    /// Create a release and run it through every phase
    Deploy {
        /// Release version (default: git HEAD, or "unknown")
        #[arg(long = "version")]
        release_version: Option<String>,
    },

    /// Roll back to an earlier release by deploying it again
    Rollback {
        /// Roll back to the current release's previous release
        #[arg(long)]
        to_previous: bool,

        /// Roll back to a specific release ID
        #[arg(long, value_name = "ID")]
        to_release: Option<String>,

        /// Roll back to the newest release with this version
        #[arg(long, value_name = "VERSION")]
        to_version: Option<String>,
    },

    /// Inspect recorded releases
    Releases {
        #[command(subcommand)]
        command: ReleasesCommand,
    },

    /// Install Docker and join the mesh network on hosts
    Bootstrap {
        /// YAML file listing the hosts to bootstrap
        #[arg(long, value_name = "FILE")]
        hosts: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ReleasesCommand {
    /// List releases, newest first (all environments unless --env is given)
    List,

    /// Show one release and its phase statuses
    Show {
        /// Release ID
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rollback_flags_parse() {
        let cli = Cli::try_parse_from([
            "stagecraft",
            "--env",
            "prod",
            "rollback",
            "--to-version",
            "1.2.0",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.env.as_deref(), Some("prod"));
        assert!(cli.dry_run);
        match cli.command {
            Commands::Rollback { to_version, to_previous, .. } => {
                assert_eq!(to_version.as_deref(), Some("1.2.0"));
                assert!(!to_previous);
            }
            _ => panic!("expected rollback"),
        }
    }

    #[test]
    fn plan_version_flag_is_per_command() {
        let cli =
            Cli::try_parse_from(["stagecraft", "plan", "--env", "staging", "--version", "v2"]).unwrap();
        match cli.command {
            Commands::Plan {
                release_version,
                format,
            } => {
                assert_eq!(release_version.as_deref(), Some("v2"));
                assert_eq!(format, PlanFormat::Text);
            }
            _ => panic!("expected plan"),
        }
    }
}
