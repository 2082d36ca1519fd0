// ABOUTME: Application-wide error types for stagecraft.
// ABOUTME: Maps every module error onto a small error taxonomy and exit codes.

use std::path::PathBuf;
use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::deploy::{ExecuteError, RollbackError};
use crate::plan::PlanError;
use crate::state::StateError;

/// Conceptual error kinds shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad flags or conflicting rollback targets.
    UserInput,
    /// Unknown environment, unresolvable provider, malformed config.
    ConfigInvalid,
    /// SSH, Docker, network, hook, or state file failures.
    ExternalDependency,
    TargetNotFound,
    TargetNotFullyDeployed,
    CannotRollbackToCurrent,
    /// The core produced something it promised never to produce.
    InternalInvariant,
}

impl ErrorKind {
    /// Process exit code for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::UserInput
            | ErrorKind::ConfigInvalid
            | ErrorKind::TargetNotFound
            | ErrorKind::TargetNotFullyDeployed
            | ErrorKind::CannotRollbackToCurrent => 1,
            ErrorKind::ExternalDependency => 2,
            ErrorKind::InternalInvariant => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    UserInput(String),

    #[error("bootstrap completed with {succeeded} success(es) and {failed} failure(s)")]
    PartialBootstrap { succeeded: usize, failed: usize },

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Rollback(#[from] RollbackError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code for scripted consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::AlreadyExists(_) => "already_exists",
            Error::ConfigNotFound(_) | Error::InvalidConfig(_) | Error::Yaml(_) => {
                "config_invalid"
            }
            Error::UserInput(_) => "user_input",
            Error::PartialBootstrap { .. } => "bootstrap_partial_failure",
            Error::Plan(e) => e.code(),
            Error::State(e) => e.code(),
            Error::Execute(e) => e.code(),
            Error::Rollback(e) => e.code(),
            Error::Bootstrap(e) => e.code(),
            Error::Io(_) | Error::Json(_) => "io",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyExists(_) | Error::UserInput(_) => ErrorKind::UserInput,
            Error::ConfigNotFound(_) | Error::InvalidConfig(_) | Error::Yaml(_) => {
                ErrorKind::ConfigInvalid
            }
            Error::PartialBootstrap { .. } | Error::Io(_) | Error::Json(_) => {
                ErrorKind::ExternalDependency
            }
            Error::Plan(e) => plan_kind(e),
            Error::State(e) => state_kind(e),
            Error::Execute(e) => execute_kind(e),
            Error::Rollback(e) => rollback_kind(e),
            Error::Bootstrap(e) => match e {
                BootstrapError::UnknownNetworkProvider { .. } => ErrorKind::ConfigInvalid,
                BootstrapError::Cancelled => ErrorKind::ExternalDependency,
            },
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

fn plan_kind(e: &PlanError) -> ErrorKind {
    match e {
        PlanError::UnknownEnvironment(_) => ErrorKind::ConfigInvalid,
        PlanError::InternalInvariant(_) => ErrorKind::InternalInvariant,
    }
}

fn state_kind(e: &StateError) -> ErrorKind {
    match e {
        StateError::ReleaseNotFound(_) | StateError::NoCurrentRelease(_) => {
            ErrorKind::TargetNotFound
        }
        StateError::InvalidInput(_) => ErrorKind::UserInput,
        StateError::Io { .. } | StateError::Corrupt { .. } | StateError::Serialize(_) => {
            ErrorKind::ExternalDependency
        }
    }
}

fn execute_kind(e: &ExecuteError) -> ErrorKind {
    match e {
        ExecuteError::State(inner) => state_kind(inner),
        ExecuteError::PhaseFailed { .. } | ExecuteError::Cancelled { .. } => {
            ErrorKind::ExternalDependency
        }
    }
}

fn rollback_kind(e: &RollbackError) -> ErrorKind {
    match e {
        RollbackError::UserInput(_) => ErrorKind::UserInput,
        RollbackError::NoCurrentRelease(_)
        | RollbackError::NoPreviousRelease(_)
        | RollbackError::TargetNotFound(_)
        | RollbackError::EnvironmentMismatch { .. }
        | RollbackError::NoMatchingVersion { .. } => ErrorKind::TargetNotFound,
        RollbackError::CannotRollbackToCurrent(_) => ErrorKind::CannotRollbackToCurrent,
        RollbackError::TargetNotFullyDeployed { .. } => ErrorKind::TargetNotFullyDeployed,
        RollbackError::State(inner) => state_kind(inner),
        RollbackError::Execute(inner) => execute_kind(inner),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
