// ABOUTME: Remote command execution through the system ssh binary.
// ABOUTME: Non-interactive batch mode with per-command timeout and cancellation.

mod client;
mod error;

pub use client::{CommandOutput, SshClient, SshTarget};
pub use error::{Error, Result};

/// Quote a value for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "-_.:/%+=,@".contains(ch))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r#"'"'"'"#))
    }
}
