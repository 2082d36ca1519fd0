// ABOUTME: Host descriptors consumed by the bootstrap engine.
// ABOUTME: Loaded from a YAML hosts file, either a bare list or under a `hosts:` key.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::HostId;

/// A remote machine to bring to a Docker + mesh network ready state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Host {
    pub fn new(id: impl Into<HostId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role: String::new(),
            public_ip: None,
            tags: Vec::new(),
        }
    }

    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    /// Hostname used on the mesh network: the name, or the ID when unnamed.
    pub fn hostname(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// The public address, if one is set and non-blank.
    pub fn address(&self) -> Option<&str> {
        self.public_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HostsFile {
    Wrapped { hosts: Vec<Host> },
    Bare(Vec<Host>),
}

/// Parse hosts from YAML. Host IDs must be non-empty and unique.
pub fn parse_hosts(yaml: &str) -> Result<Vec<Host>> {
    let hosts = match serde_yaml::from_str::<HostsFile>(yaml)? {
        HostsFile::Wrapped { hosts } | HostsFile::Bare(hosts) => hosts,
    };

    let mut seen = std::collections::HashSet::new();
    for host in &hosts {
        if host.id.as_str().trim().is_empty() {
            return Err(Error::InvalidConfig("host id must not be empty".to_string()));
        }
        if !seen.insert(host.id.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "duplicate host id {:?}",
                host.id.as_str()
            )));
        }
    }

    Ok(hosts)
}

/// Load hosts from a YAML file.
pub fn load_hosts(path: &Path) -> Result<Vec<Host>> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_hosts(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_and_bare_lists() {
        let wrapped = parse_hosts(
            r#"
hosts:
  - id: h1
    name: app-1
    role: app
    public_ip: 203.0.113.10
    tags: ["tag:app"]
"#,
        )
        .unwrap();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].role, "app");
        assert_eq!(wrapped[0].address(), Some("203.0.113.10"));

        let bare = parse_hosts("- id: h2\n- id: h3\n").unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[1].id, "h3");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = parse_hosts("- id: h1\n- id: h1\n").unwrap_err();
        assert!(err.to_string().contains("duplicate host id"));
    }

    #[test]
    fn hostname_falls_back_to_id() {
        let host = Host::new("h-42");
        assert_eq!(host.hostname(), "h-42");
        assert_eq!(host.address(), None);

        let named = Host {
            name: "db-1".to_string(),
            ..Host::new("h-43")
        };
        assert_eq!(named.hostname(), "db-1");
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let err = load_hosts(Path::new("/nonexistent/hosts.yml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}
