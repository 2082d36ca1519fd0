// ABOUTME: Host bootstrap engine: brings raw hosts to a Docker + mesh network ready state.
// ABOUTME: Hosts run sequentially in ID order; per-host failures are collected, not fatal.

mod error;
mod executor;
mod host;
mod state;
mod steps;

pub use error::{BootstrapError, HostError};
pub use executor::{CommandExecutor, SshExecutor};
pub use host::{Host, load_hosts, parse_hosts};
pub use state::{Connected, Done, DockerReady, Start};
pub use steps::{HostBootstrap, NetworkStep, docker_install_commands};

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::BootstrapConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::network::NetworkRegistry;

/// Outcome for one host.
#[derive(Debug, Clone, Serialize)]
pub struct HostResult {
    pub host: Host,
    pub success: bool,
    /// Stable error code of the failing step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// `"<code>: <message>"` for failed hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostResult {
    pub(crate) fn succeeded(host: Host) -> Self {
        Self {
            host,
            success: true,
            code: None,
            error: None,
        }
    }

    fn failed(host: Host, err: &HostError) -> Self {
        Self {
            host,
            success: false,
            code: Some(err.code()),
            error: Some(format!("{}: {err}", err.code())),
        }
    }
}

/// Per-host results in host ID order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapResult {
    pub hosts: Vec<HostResult>,
}

impl BootstrapResult {
    pub fn success_count(&self) -> usize {
        self.hosts.iter().filter(|h| h.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.hosts.len() - self.success_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }
}

/// Drives hosts through ssh -> docker -> network.
pub struct Bootstrapper<'a> {
    executor: Arc<dyn CommandExecutor>,
    networks: &'a NetworkRegistry,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(executor: Arc<dyn CommandExecutor>, networks: &'a NetworkRegistry) -> Self {
        Self { executor, networks }
    }

    /// Bootstrap every host. Only an unknown network provider or cancellation
    /// returns an error; everything else is reported per host.
    pub async fn bootstrap(
        &self,
        hosts: &[Host],
        config: &BootstrapConfig,
        cancel: &CancellationToken,
        diagnostics: &mut Diagnostics,
    ) -> Result<BootstrapResult, BootstrapError> {
        let network = match &config.network {
            Some(net) => {
                let provider = self.networks.get(&net.provider).ok_or_else(|| {
                    BootstrapError::UnknownNetworkProvider {
                        provider: net.provider.clone(),
                        available: self.networks.ids(),
                    }
                })?;
                Some((provider, net.config.as_ref()))
            }
            None => None,
        };

        let mut hosts = hosts.to_vec();
        hosts.sort_by(|a, b| a.id.cmp(&b.id));

        if network.is_none() {
            for host in hosts.iter().filter(|h| !h.tags.is_empty()) {
                diagnostics.warn(Warning::ignored_tags(format!(
                    "host {} has tags but no network provider is configured",
                    host.id
                )));
            }
        }

        let mut result = BootstrapResult {
            hosts: Vec::with_capacity(hosts.len()),
        };

        for host in &hosts {
            if cancel.is_cancelled() {
                return Err(BootstrapError::Cancelled);
            }

            tracing::info!(host = %host.id, "bootstrapping host");
            let step = network.as_ref().map(|(provider, config)| NetworkStep {
                provider: provider.as_ref(),
                config: *config,
            });

            match self.bootstrap_host(host, config, step, cancel).await {
                Ok(done) => {
                    tracing::info!(host = %host.id, "host bootstrapped");
                    result.hosts.push(done);
                }
                Err(HostError::Cancelled) => return Err(BootstrapError::Cancelled),
                Err(e) => {
                    tracing::warn!(host = %host.id, code = e.code(), error = %e, "host bootstrap failed");
                    result.hosts.push(HostResult::failed(host.clone(), &e));
                }
            }
        }

        Ok(result)
    }

    async fn bootstrap_host(
        &self,
        host: &Host,
        config: &BootstrapConfig,
        network: Option<NetworkStep<'_>>,
        cancel: &CancellationToken,
    ) -> Result<HostResult, HostError> {
        Ok(HostBootstrap::new(host, self.executor.as_ref(), cancel)
            .connect()
            .await?
            .ensure_docker(&config.docker)
            .await?
            .ensure_network(network)
            .await?
            .finish())
    }
}
