// ABOUTME: Bootstrap error types: per-host step failures and run-wide failures.
// ABOUTME: Host errors land in the result; only run-wide errors abort the whole run.

use crate::network::NetworkError;
use crate::ssh;

/// Failure of one bootstrap step on one host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{0}")]
    Ssh(#[source] ssh::Error),

    #[error("docker install failed: {0}")]
    DockerInstall(#[source] ssh::Error),

    #[error("docker verification failed after install: {0}")]
    DockerVerify(#[source] ssh::Error),

    #[error("network install failed: {0}")]
    NetworkInstall(#[source] NetworkError),

    #[error("network join failed: {0}")]
    NetworkJoin(#[source] NetworkError),

    #[error("bootstrap cancelled")]
    Cancelled,
}

impl HostError {
    pub fn code(&self) -> &'static str {
        match self {
            HostError::Ssh(_) => "ssh_failed",
            HostError::DockerInstall(_) => "docker_install_failed",
            HostError::DockerVerify(_) => "docker_verify_failed",
            HostError::NetworkInstall(_) => "network_install_failed",
            HostError::NetworkJoin(_) => "network_join_failed",
            HostError::Cancelled => "cancelled",
        }
    }

    /// Wrap an ssh error, keeping cancellation distinct from step failures.
    pub(crate) fn from_ssh(err: ssh::Error, wrap: fn(ssh::Error) -> HostError) -> HostError {
        match err {
            ssh::Error::Cancelled => HostError::Cancelled,
            other => wrap(other),
        }
    }

    pub(crate) fn from_network(
        err: NetworkError,
        wrap: fn(NetworkError) -> HostError,
    ) -> HostError {
        if err.is_cancelled() {
            HostError::Cancelled
        } else {
            wrap(err)
        }
    }
}

/// Errors that abort a bootstrap run without producing a result.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("unknown network provider {provider:?} (available: {})", .available.join(", "))]
    UnknownNetworkProvider {
        provider: String,
        available: Vec<String>,
    },

    #[error("bootstrap cancelled")]
    Cancelled,
}

impl BootstrapError {
    pub fn code(&self) -> &'static str {
        match self {
            BootstrapError::UnknownNetworkProvider { .. } => "config_invalid",
            BootstrapError::Cancelled => "cancelled",
        }
    }
}
