// ABOUTME: SSH client that shells out to the system ssh binary.
// ABOUTME: Kills the child process when the timeout or cancellation token fires.

use std::ffi::OsString;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::error::{Error, Result};

/// `user@host` destination for a remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
}

impl SshTarget {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }
}

impl fmt::Display for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs commands on remote hosts via `ssh -o BatchMode=yes`.
#[derive(Debug, Clone)]
pub struct SshClient {
    program: OsString,
    timeout: Duration,
}

impl SshClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: OsString::from("ssh"),
            timeout,
        }
    }

    /// Use a different ssh binary.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arguments passed to ssh for `command` on `target`.
    pub fn args(target: &SshTarget, command: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            target.to_string(),
            command.to_string(),
        ]
    }

    /// Execute `command` on `target`. A non-zero exit is an error.
    pub async fn exec(
        &self,
        target: &SshTarget,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput> {
        tracing::debug!(%target, "running remote command");

        let child = Command::new(&self.program)
            .args(Self::args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                target: target.to_string(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|source| Error::Spawn {
                target: target.to_string(),
                source,
            })?,
            _ = tokio::time::sleep(self.timeout) => {
                return Err(Error::Timeout {
                    target: target.to_string(),
                    timeout: self.timeout,
                });
            }
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(Error::CommandFailed {
                target: target.to_string(),
                exit_code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput {
            exit_code: 0,
            stdout,
            stderr,
        })
    }
}
