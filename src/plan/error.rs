// ABOUTME: Error types for deployment planning.
// ABOUTME: Separates unknown environments from internal invariant violations.

/// Errors that can occur while computing a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The environment is not defined in configuration.
    #[error("environment {0:?} not found in config")]
    UnknownEnvironment(String),

    /// The planner produced a malformed plan.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl PlanError {
    /// Stable error code for scripted consumers.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::UnknownEnvironment(_) => "unknown_environment",
            PlanError::InternalInvariant(_) => "internal_invariant",
        }
    }
}
