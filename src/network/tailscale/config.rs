// ABOUTME: Tailscale provider configuration parsed from the opaque network config block.
// ABOUTME: Validates required fields and computes the tag set for a host.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::network::NetworkError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailscaleConfig {
    /// Name of the environment variable holding the auth key.
    #[serde(default)]
    pub auth_key_env: String,
    #[serde(default)]
    pub tailnet_domain: String,
    #[serde(default)]
    pub default_tags: Vec<String>,
    /// Extra tags by host role.
    #[serde(default)]
    pub role_tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub method: InstallMode,
    /// Installed clients older than this are reinstalled.
    #[serde(default)]
    pub min_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    #[default]
    Auto,
    Skip,
}

impl TailscaleConfig {
    /// Parse and validate. A missing block is invalid: two fields are required.
    pub fn parse(value: Option<&serde_yaml::Value>) -> Result<Self, NetworkError> {
        let config: TailscaleConfig = match value {
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| NetworkError::ConfigInvalid(e.to_string()))?,
            None => TailscaleConfig::default(),
        };

        if config.auth_key_env.trim().is_empty() {
            return Err(NetworkError::ConfigInvalid(
                "auth_key_env is required".to_string(),
            ));
        }
        if config.tailnet_domain.trim().is_empty() {
            return Err(NetworkError::ConfigInvalid(
                "tailnet_domain is required".to_string(),
            ));
        }

        Ok(config)
    }

    /// Sorted union of default tags, role tags, and host tags.
    pub fn tags_for(&self, role: &str, host_tags: &[String]) -> Vec<String> {
        let role_tags = self.role_tags.get(role).into_iter().flatten();
        self.default_tags
            .iter()
            .chain(role_tags)
            .chain(host_tags)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether `tailnet` is the configured tailnet or a subdomain of it.
    pub fn matches_tailnet(&self, tailnet: &str) -> bool {
        tailnet == self.tailnet_domain || tailnet.ends_with(&format!(".{}", self.tailnet_domain))
    }

    pub fn node_fqdn(&self, host: &str) -> Result<String, NetworkError> {
        if !self.tailnet_domain.contains('.') {
            return Err(NetworkError::ConfigInvalid(format!(
                "tailnet_domain {:?} must contain a dot",
                self.tailnet_domain
            )));
        }
        Ok(format!("{host}.{}", self.tailnet_domain))
    }
}

/// Compare dotted numeric versions; non-numeric parts compare as zero.
pub(crate) fn version_at_least(actual: &str, minimum: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .trim_start_matches('v')
            .split('.')
            .map(|part| {
                part.chars()
                    .take_while(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .collect()
    };
    let (a, m) = (parse(actual), parse(minimum));
    for i in 0..a.len().max(m.len()) {
        let (x, y) = (a.get(i).copied().unwrap_or(0), m.get(i).copied().unwrap_or(0));
        if x != y {
            return x > y;
        }
    }
    true
}
