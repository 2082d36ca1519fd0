// ABOUTME: SSH-specific error types.
// ABOUTME: Covers spawn failures, non-zero exits, timeouts, and cancellation.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("host {0} has no public IP")]
    MissingAddress(String),

    #[error("ssh to {target} failed: {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ssh to {target} failed: {}", describe_exit(*.exit_code, .stderr))]
    CommandFailed {
        target: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("ssh to {target} failed: command timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("ssh command cancelled")]
    Cancelled,
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Cancelled => "cancelled",
            _ => "ssh_failed",
        }
    }

    /// Remote stderr, when the command ran and failed.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn describe_exit(exit_code: Option<i32>, stderr: &str) -> String {
    let status = match exit_code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
