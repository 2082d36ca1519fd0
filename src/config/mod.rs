// ABOUTME: Configuration types and parsing for stagecraft.yml.
// ABOUTME: Handles YAML parsing, discovery, and validation of the project config.

mod bootstrap;
mod database;
mod init;

pub use bootstrap::{
    BootstrapConfig, DockerConfig, InfraConfig, InstallMethod, NetworkConfig, SshConfig,
};
pub use database::{DatabaseConfig, MigrationConfig, MigrationStrategy};
pub use init::init_config;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "stagecraft.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagecraft.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagecraft/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,

    #[serde(default)]
    pub backend: Option<BackendConfig>,

    #[serde(default)]
    pub databases: HashMap<String, DatabaseConfig>,

    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,

    #[serde(default)]
    pub infra: Option<InfraConfig>,

    /// Where this config was loaded from, if it came from disk.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub provider: String,
    /// Provider-specific settings keyed by provider ID. Opaque to the core.
    #[serde(default)]
    pub providers: Option<HashMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub driver: String,
    #[serde(default)]
    pub env_file: Option<PathBuf>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.is_file() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// Environment names in sorted order.
    pub fn environment_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Bootstrap settings, falling back to defaults when `infra.bootstrap` is absent.
    pub fn bootstrap(&self) -> BootstrapConfig {
        self.infra
            .as_ref()
            .and_then(|infra| infra.bootstrap.clone())
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "project.name must be non-empty".to_string(),
            ));
        }

        if let Some(backend) = &self.backend {
            if backend.provider.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "backend.provider is required".to_string(),
                ));
            }
            if let Some(providers) = &backend.providers
                && !providers.contains_key(&backend.provider)
            {
                return Err(Error::InvalidConfig(format!(
                    "backend.providers.{} is missing; provider-specific config is required",
                    backend.provider
                )));
            }
        }

        let mut names: Vec<&String> = self.databases.keys().collect();
        names.sort();
        for name in names {
            self.databases[name].validate(name)?;
        }

        let mut names: Vec<&String> = self.environments.keys().collect();
        names.sort();
        for name in names {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "environment name must be non-empty".to_string(),
                ));
            }
            if self.environments[name].driver.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "environment {name:?}: driver must be non-empty"
                )));
            }
        }

        let network = self
            .infra
            .as_ref()
            .and_then(|i| i.bootstrap.as_ref())
            .and_then(|b| b.network.as_ref());
        if let Some(network) = network
            && network.provider.trim().is_empty()
        {
            return Err(Error::InvalidConfig(
                "infra.bootstrap.network.provider must be non-empty".to_string(),
            ));
        }

        Ok(())
    }
}
