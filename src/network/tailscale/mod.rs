// ABOUTME: Tailscale network provider: installs the client and joins hosts to a tailnet.
// ABOUTME: All remote work goes through the bootstrap command executor.

mod config;
mod status;

pub use config::{InstallConfig, InstallMode, TailscaleConfig};
pub use status::{NodeInfo, TailscaleStatus};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::{CommandExecutor, Host};
use crate::ssh;

use super::{InstallOptions, JoinOptions, NetworkError, NetworkProvider};

const INSTALL_SCRIPT: &str = "curl -fsSL https://tailscale.com/install.sh | sh";
const SUPPORTED_DISTROS: [&str; 2] = ["debian", "ubuntu"];

pub struct TailscaleProvider {
    executor: Arc<dyn CommandExecutor>,
}

impl TailscaleProvider {
    pub const ID: &'static str = "tailscale";

    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    async fn run(
        &self,
        host: &Host,
        command: &str,
        cancel: &CancellationToken,
    ) -> ssh::Result<ssh::CommandOutput> {
        self.executor.run(host, command, cancel).await
    }

    /// Installed version from `tailscale version`, or `None` if not installed.
    async fn installed_version(
        &self,
        host: &Host,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, NetworkError> {
        match self.run(host, "tailscale version", cancel).await {
            Ok(out) => Ok(out.stdout.lines().next().map(|l| l.trim().to_string())),
            Err(ssh::Error::Cancelled) => Err(ssh::Error::Cancelled.into()),
            Err(_) => Ok(None),
        }
    }

    /// Linux, and Debian or Ubuntu when the distribution can be determined.
    async fn check_os(&self, host: &Host, cancel: &CancellationToken) -> Result<(), NetworkError> {
        let uname = match self.run(host, "uname -s", cancel).await {
            Ok(out) => out.stdout,
            Err(ssh::Error::Cancelled) => return Err(ssh::Error::Cancelled.into()),
            Err(_) => return Ok(()),
        };
        if !uname.to_lowercase().contains("linux") {
            return Err(NetworkError::UnsupportedOs(format!(
                "detected {:?}, only Linux (Debian/Ubuntu) is supported",
                uname.trim()
            )));
        }

        let distro = match self.run(host, "cat /etc/os-release", cancel).await {
            Ok(out) => os_release_id(&out.stdout),
            Err(ssh::Error::Cancelled) => return Err(ssh::Error::Cancelled.into()),
            Err(_) => match self.run(host, "lsb_release -i -s", cancel).await {
                Ok(out) => Some(out.stdout.trim().to_lowercase()),
                Err(ssh::Error::Cancelled) => return Err(ssh::Error::Cancelled.into()),
                Err(_) => None,
            },
        };

        match distro {
            Some(id) if !id.is_empty() && !SUPPORTED_DISTROS.contains(&id.as_str()) => {
                Err(NetworkError::UnsupportedOs(format!(
                    "detected distribution {id:?}, only Debian/Ubuntu are supported"
                )))
            }
            _ => Ok(()),
        }
    }

    async fn status(
        &self,
        host: &Host,
        cancel: &CancellationToken,
    ) -> Result<TailscaleStatus, NetworkError> {
        let out = self.run(host, "tailscale status --json", cancel).await?;
        TailscaleStatus::parse(&out.stdout)
    }

    fn verify(
        config: &TailscaleConfig,
        status: &TailscaleStatus,
        tags: &[String],
    ) -> Result<(), NetworkError> {
        if !config.matches_tailnet(status.tailnet()) {
            return Err(NetworkError::TailnetMismatch {
                actual: status.tailnet().to_string(),
                expected: config.tailnet_domain.clone(),
            });
        }
        if !status.tags_match(tags) {
            return Err(NetworkError::TagMismatch {
                actual: status.node.tags.clone(),
                expected: tags.to_vec(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkProvider for TailscaleProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn ensure_installed(
        &self,
        opts: InstallOptions<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), NetworkError> {
        let config = TailscaleConfig::parse(opts.config)?;
        let host = opts.host;

        if config.install.method == InstallMode::Skip {
            tracing::debug!(host = %host.id, "tailscale install skipped by config");
            return Ok(());
        }

        if let Some(version) = self.installed_version(host, cancel).await? {
            match &config.install.min_version {
                Some(min) if !config::version_at_least(&version, min) => {
                    tracing::info!(host = %host.id, %version, minimum = %min, "upgrading tailscale");
                }
                _ => {
                    tracing::debug!(host = %host.id, %version, "tailscale already installed");
                    return Ok(());
                }
            }
        } else {
            self.check_os(host, cancel).await?;
            tracing::info!(host = %host.id, "installing tailscale");
        }

        if let Err(e) = self.run(host, INSTALL_SCRIPT, cancel).await {
            return Err(match e {
                ssh::Error::Cancelled => e.into(),
                other => NetworkError::InstallFailed(
                    other.stderr().map(str::trim).unwrap_or_default().to_string(),
                ),
            });
        }

        match self.installed_version(host, cancel).await? {
            Some(_) => Ok(()),
            None => Err(NetworkError::InstallFailed(
                "installation verification failed".to_string(),
            )),
        }
    }

    async fn ensure_joined(
        &self,
        opts: JoinOptions<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), NetworkError> {
        let config = TailscaleConfig::parse(opts.config)?;
        let host = opts.host;

        let auth_key = std::env::var(&config.auth_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NetworkError::AuthKeyMissing(config.auth_key_env.clone()))?;

        let tags = config.tags_for(&host.role, opts.tags);

        match self.status(host, cancel).await {
            Ok(status) if config.matches_tailnet(status.tailnet()) => {
                if status.tags_match(&tags) {
                    tracing::debug!(host = %host.id, "already joined with expected tags");
                    return Ok(());
                }
            }
            Ok(status) if !status.tailnet().is_empty() => {
                return Err(NetworkError::TailnetMismatch {
                    actual: status.tailnet().to_string(),
                    expected: config.tailnet_domain.clone(),
                });
            }
            Err(e) if e.is_cancelled() => return Err(e),
            _ => {}
        }

        tracing::info!(host = %host.id, tags = ?tags, "joining tailnet");
        let up = format!(
            "tailscale up --authkey={} --hostname={} --advertise-tags={}",
            ssh::shell_quote(&auth_key),
            ssh::shell_quote(host.hostname()),
            ssh::shell_quote(&tags.join(","))
        );
        if let Err(e) = self.run(host, &up, cancel).await {
            return Err(match e {
                ssh::Error::Cancelled => e.into(),
                other => {
                    let stderr = other.stderr().unwrap_or_default();
                    if stderr.contains("invalid") || stderr.contains("expired") {
                        NetworkError::AuthKeyInvalid
                    } else {
                        NetworkError::JoinFailed(other.to_string())
                    }
                }
            });
        }

        let status = self.status(host, cancel).await?;
        Self::verify(&config, &status, &tags)
    }

    fn node_fqdn(
        &self,
        host: &str,
        config: Option<&serde_yaml::Value>,
    ) -> Result<String, NetworkError> {
        TailscaleConfig::parse(config)?.node_fqdn(host)
    }
}

/// `ID=` from /etc/os-release, lowercased and unquoted.
fn os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|id| id.trim().trim_matches('"').to_lowercase())
}
