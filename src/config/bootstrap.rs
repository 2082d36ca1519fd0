// ABOUTME: Host bootstrap configuration under infra.bootstrap.
// ABOUTME: Covers the SSH user, Docker install settings, and mesh network provider.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfraConfig {
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub docker: DockerConfig,

    /// Mesh network provider. Network setup is skipped when absent.
    #[serde(default)]
    pub network: Option<NetworkConfig>,
}

impl BootstrapConfig {
    /// SSH user for initial connectivity, `root` when unset.
    pub fn ssh_user(&self) -> &str {
        match self.ssh.user.as_deref() {
            Some(user) if !user.trim().is_empty() => user,
            _ => "root",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    #[serde(default)]
    pub user: Option<String>,

    /// Per-command timeout for remote commands.
    #[serde(default = "default_ssh_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: None,
            timeout: default_ssh_timeout(),
        }
    }
}

fn default_ssh_timeout() -> Duration {
    Duration::from_secs(300)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_docker_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub install_method: InstallMethod,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            enabled: default_docker_enabled(),
            install_method: InstallMethod::default(),
        }
    }
}

fn default_docker_enabled() -> bool {
    true
}

/// How Docker gets installed on a host that lacks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// `apt-get install docker.io` (Debian/Ubuntu).
    #[default]
    Apt,
    /// Docker's convenience script from get.docker.com.
    Script,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Registered provider ID, e.g. `tailscale`.
    pub provider: String,

    /// Provider-specific settings, decoded by the provider itself.
    #[serde(default)]
    pub config: Option<serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_bootstrap_section() {
        let yaml = r#"
ssh:
  user: deploy
  timeout: 2m
docker:
  enabled: true
  install_method: script
network:
  provider: tailscale
  config:
    auth_key_env: TS_AUTHKEY
    tailnet_domain: example.ts.net
"#;
        let config: BootstrapConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ssh_user(), "deploy");
        assert_eq!(config.ssh.timeout, Duration::from_secs(120));
        assert_eq!(config.docker.install_method, InstallMethod::Script);
        let network = config.network.unwrap();
        assert_eq!(network.provider, "tailscale");
        assert!(network.config.is_some());
    }

    #[test]
    fn blank_user_falls_back_to_root() {
        let config = BootstrapConfig {
            ssh: SshConfig {
                user: Some("  ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.ssh_user(), "root");
    }

    #[test]
    fn docker_can_be_disabled() {
        let config: BootstrapConfig = serde_yaml::from_str("docker:\n  enabled: false\n").unwrap();
        assert!(!config.docker.enabled);
        assert_eq!(config.docker.install_method, InstallMethod::Apt);
    }
}
