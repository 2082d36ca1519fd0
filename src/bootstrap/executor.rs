// ABOUTME: Command execution seam between the bootstrap engine and remote hosts.
// ABOUTME: SshExecutor resolves a host's address and runs commands through the ssh client.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::BootstrapConfig;
use crate::ssh::{self, CommandOutput, SshClient, SshTarget};

use super::Host;

/// Runs a shell command on a host. A non-zero exit is an error.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(
        &self,
        host: &Host,
        command: &str,
        cancel: &CancellationToken,
    ) -> ssh::Result<CommandOutput>;
}

/// Executes commands over the system ssh binary.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    client: SshClient,
    user: String,
}

impl SshExecutor {
    pub fn new(user: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(SshClient::new(timeout), user)
    }

    pub fn with_client(client: SshClient, user: impl Into<String>) -> Self {
        let user = user.into();
        let user = if user.trim().is_empty() {
            "root".to_string()
        } else {
            user
        };
        Self { client, user }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(config.ssh_user(), config.ssh.timeout)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn target(&self, host: &Host) -> ssh::Result<SshTarget> {
        let ip = host
            .address()
            .ok_or_else(|| ssh::Error::MissingAddress(host.id.to_string()))?;
        Ok(SshTarget::new(&self.user, ip))
    }
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn run(
        &self,
        host: &Host,
        command: &str,
        cancel: &CancellationToken,
    ) -> ssh::Result<CommandOutput> {
        let target = self.target(host)?;
        self.client.exec(&target, command, cancel).await
    }
}
