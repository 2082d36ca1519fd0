// ABOUTME: Error types for the release state store.
// ABOUTME: Covers lookups, input validation, and state file I/O.

use std::path::PathBuf;

/// Errors that can occur while reading or writing release state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// No release with this ID exists.
    #[error("release {0:?} not found")]
    ReleaseNotFound(String),

    /// The environment has no releases yet.
    #[error("no release found for environment {0:?}")]
    NoCurrentRelease(String),

    /// Caller supplied an empty or otherwise invalid value.
    #[error("{0}")]
    InvalidInput(String),

    /// State file could not be read or written.
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State file exists but is not valid JSON for the schema.
    #[error("parsing state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serializing state: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StateError {
    /// Stable error code for scripted consumers.
    pub fn code(&self) -> &'static str {
        match self {
            StateError::ReleaseNotFound(_) | StateError::NoCurrentRelease(_) => "not_found",
            StateError::InvalidInput(_) => "user_input",
            StateError::Io { .. } | StateError::Corrupt { .. } | StateError::Serialize(_) => {
                "state_io"
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}
