// ABOUTME: Database and migration configuration.
// ABOUTME: Migration strategy decides whether a database migrates before or after rollout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub migrations: Option<MigrationConfig>,
    /// Environment variable holding the connection string.
    #[serde(default)]
    pub connection_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    pub engine: String,
    pub path: String,
    /// Unset means the database is never planned.
    #[serde(default)]
    pub strategy: Option<MigrationStrategy>,
}

/// When a database's migrations run relative to the rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStrategy {
    PreDeploy,
    PostDeploy,
    /// Never planned; run by hand.
    Manual,
}

impl MigrationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStrategy::PreDeploy => "pre_deploy",
            MigrationStrategy::PostDeploy => "post_deploy",
            MigrationStrategy::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pre_deploy" => Some(MigrationStrategy::PreDeploy),
            "post_deploy" => Some(MigrationStrategy::PostDeploy),
            "manual" => Some(MigrationStrategy::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for MigrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatabaseConfig {
    pub(super) fn validate(&self, name: &str) -> Result<()> {
        let Some(migrations) = &self.migrations else {
            return Ok(());
        };
        if migrations.engine.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "databases.{name}.migrations.engine is required"
            )));
        }
        if migrations.path.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "databases.{name}.migrations.path is required"
            )));
        }
        Ok(())
    }
}
