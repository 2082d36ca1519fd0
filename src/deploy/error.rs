// ABOUTME: Error types for phase execution and rollback.
// ABOUTME: Each variant carries a stable code for scripted consumers.

use crate::state::{Phase, StateError};

/// Error returned by a phase function. Phase functions wrap whatever they call.
pub type PhaseError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from running a release through its phases.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// A phase function returned an error; downstream phases were marked skipped.
    #[error("phase {phase} failed for release {release}: {source}")]
    PhaseFailed {
        release: String,
        phase: Phase,
        #[source]
        source: PhaseError,
    },

    /// Cancellation was observed before or during `phase`.
    #[error("release {release} cancelled at phase {phase}")]
    Cancelled { release: String, phase: Phase },

    #[error(transparent)]
    State(#[from] StateError),
}

impl ExecuteError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecuteError::PhaseFailed { .. } => "phase_failed",
            ExecuteError::Cancelled { .. } => "cancelled",
            ExecuteError::State(e) => e.code(),
        }
    }

    /// The phase at which execution stopped, if it got that far.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ExecuteError::PhaseFailed { phase, .. } | ExecuteError::Cancelled { phase, .. } => {
                Some(*phase)
            }
            ExecuteError::State(_) => None,
        }
    }
}

/// Errors from resolving, validating, or executing a rollback.
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    #[error("{0}")]
    UserInput(String),

    #[error("no release found for environment {0:?}")]
    NoCurrentRelease(String),

    #[error("release {0} has no previous release to roll back to")]
    NoPreviousRelease(String),

    #[error("rollback target not found: {0:?}")]
    TargetNotFound(String),

    #[error("release {id:?} belongs to environment {actual:?}, not {expected:?}")]
    EnvironmentMismatch {
        id: String,
        actual: String,
        expected: String,
    },

    #[error("no release found with version {version:?} in environment {environment:?}")]
    NoMatchingVersion {
        version: String,
        environment: String,
    },

    #[error("cannot roll back to current release {0:?}")]
    CannotRollbackToCurrent(String),

    #[error("rollback target {id:?} is not fully deployed (incomplete phases: {})", join_phases(.phases))]
    TargetNotFullyDeployed { id: String, phases: Vec<Phase> },

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl RollbackError {
    pub fn code(&self) -> &'static str {
        match self {
            RollbackError::UserInput(_) => "user_input",
            RollbackError::NoCurrentRelease(_) => "not_found",
            RollbackError::NoPreviousRelease(_) => "no_previous_release",
            RollbackError::TargetNotFound(_) => "target_not_found",
            RollbackError::EnvironmentMismatch { .. } => "environment_mismatch",
            RollbackError::NoMatchingVersion { .. } => "no_matching_version",
            RollbackError::CannotRollbackToCurrent(_) => "cannot_rollback_to_current",
            RollbackError::TargetNotFullyDeployed { .. } => "target_not_fully_deployed",
            RollbackError::State(e) => e.code(),
            RollbackError::Execute(e) => e.code(),
        }
    }
}

fn join_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(Phase::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
