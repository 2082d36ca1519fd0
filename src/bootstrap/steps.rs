// ABOUTME: Bootstrap steps for a single host, parameterized by state marker.
// ABOUTME: Each step is idempotent: detection first, side effects only when something is missing.

use tokio_util::sync::CancellationToken;

use crate::config::{DockerConfig, InstallMethod};
use crate::network::{InstallOptions, JoinOptions, NetworkProvider};

use super::error::HostError;
use super::executor::CommandExecutor;
use super::state::{Connected, DockerReady, Done, Start};
use super::{Host, HostResult};

const DOCKER_DETECT: &str = "docker version";
const SSH_PROBE: &str = "true";

/// Remote commands that install Docker with `method`.
pub fn docker_install_commands(method: InstallMethod) -> &'static [&'static str] {
    match method {
        InstallMethod::Apt => &[
            "apt-get update -y",
            "apt-get install -y docker.io",
            "systemctl enable --now docker",
        ],
        InstallMethod::Script => &[
            "curl -fsSL https://get.docker.com | sh",
            "systemctl enable --now docker",
        ],
    }
}

/// A network provider together with its opaque config block.
#[derive(Clone, Copy)]
pub struct NetworkStep<'a> {
    pub provider: &'a dyn NetworkProvider,
    pub config: Option<&'a serde_yaml::Value>,
}

/// One host moving through the bootstrap steps.
pub struct HostBootstrap<'a, S> {
    host: &'a Host,
    executor: &'a dyn CommandExecutor,
    cancel: &'a CancellationToken,
    #[allow(dead_code)]
    state: S,
}

impl<'a, S> HostBootstrap<'a, S> {
    pub fn host(&self) -> &Host {
        self.host
    }

    fn advance<N>(self, state: N) -> HostBootstrap<'a, N> {
        HostBootstrap {
            host: self.host,
            executor: self.executor,
            cancel: self.cancel,
            state,
        }
    }

    fn check_cancelled(&self) -> Result<(), HostError> {
        if self.cancel.is_cancelled() {
            return Err(HostError::Cancelled);
        }
        Ok(())
    }
}

impl<'a> HostBootstrap<'a, Start> {
    pub fn new(
        host: &'a Host,
        executor: &'a dyn CommandExecutor,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            host,
            executor,
            cancel,
            state: Start,
        }
    }

    /// Probe the host over SSH.
    pub async fn connect(self) -> Result<HostBootstrap<'a, Connected>, HostError> {
        self.check_cancelled()?;
        tracing::debug!(host = %self.host.id, "probing ssh");
        self.executor
            .run(self.host, SSH_PROBE, self.cancel)
            .await
            .map_err(|e| HostError::from_ssh(e, HostError::Ssh))?;
        Ok(self.advance(Connected))
    }
}

impl<'a> HostBootstrap<'a, Connected> {
    /// Make sure Docker is installed and working. Skipped when disabled.
    pub async fn ensure_docker(
        self,
        config: &DockerConfig,
    ) -> Result<HostBootstrap<'a, DockerReady>, HostError> {
        self.check_cancelled()?;
        let host = self.host;

        if !config.enabled {
            tracing::debug!(host = %host.id, "docker disabled, skipping");
            return Ok(self.advance(DockerReady));
        }

        match self.executor.run(host, DOCKER_DETECT, self.cancel).await {
            Ok(_) => {
                tracing::debug!(host = %host.id, "docker already present");
                return Ok(self.advance(DockerReady));
            }
            Err(crate::ssh::Error::Cancelled) => return Err(HostError::Cancelled),
            Err(_) => {}
        }

        tracing::info!(host = %host.id, method = ?config.install_method, "installing docker");
        for command in docker_install_commands(config.install_method) {
            self.check_cancelled()?;
            self.executor
                .run(host, command, self.cancel)
                .await
                .map_err(|e| HostError::from_ssh(e, HostError::DockerInstall))?;
        }

        self.executor
            .run(host, DOCKER_DETECT, self.cancel)
            .await
            .map_err(|e| HostError::from_ssh(e, HostError::DockerVerify))?;

        Ok(self.advance(DockerReady))
    }
}

impl<'a> HostBootstrap<'a, DockerReady> {
    /// Install and join the mesh network when a provider is configured.
    pub async fn ensure_network(
        self,
        network: Option<NetworkStep<'_>>,
    ) -> Result<HostBootstrap<'a, Done>, HostError> {
        let Some(network) = network else {
            return Ok(self.advance(Done));
        };
        self.check_cancelled()?;
        let host = self.host;

        tracing::debug!(host = %host.id, provider = network.provider.id(), "ensuring network installed");
        network
            .provider
            .ensure_installed(
                InstallOptions {
                    host,
                    config: network.config,
                },
                self.cancel,
            )
            .await
            .map_err(|e| HostError::from_network(e, HostError::NetworkInstall))?;

        self.check_cancelled()?;
        tracing::debug!(host = %host.id, provider = network.provider.id(), "ensuring network joined");
        network
            .provider
            .ensure_joined(
                JoinOptions {
                    host,
                    config: network.config,
                    tags: &host.tags,
                },
                self.cancel,
            )
            .await
            .map_err(|e| HostError::from_network(e, HostError::NetworkJoin))?;

        Ok(self.advance(Done))
    }
}

impl HostBootstrap<'_, Done> {
    pub fn finish(self) -> HostResult {
        HostResult::succeeded(self.host.clone())
    }
}
