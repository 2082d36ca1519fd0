// ABOUTME: Migration engine seam: engines are registered explicitly and driven from planned operations.
// ABOUTME: SQL execution lives in engines supplied by the embedding application.

mod error;

pub use error::MigrationError;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::MigrationStrategy;
use crate::plan::{Operation, OperationType, Plan};
use crate::types::OperationId;

/// A migration known to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: String,
    pub description: String,
    pub applied: bool,
}

/// Everything an engine needs to migrate one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub operation: OperationId,
    pub database: String,
    pub engine: String,
    pub path: PathBuf,
    pub strategy: MigrationStrategy,
    /// Environment variable holding the connection string.
    pub connection_env: Option<String>,
}

impl MigrationRequest {
    /// Read a planned migration operation's metadata.
    pub fn from_operation(op: &Operation) -> Result<Self, MigrationError> {
        if op.kind != OperationType::Migration {
            return Err(MigrationError::NotMigration(op.id.to_string()));
        }

        let required = |key: &'static str| {
            op.meta_str(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MigrationError::MissingMetadata {
                    operation: op.id.to_string(),
                    key,
                })
        };

        let raw_strategy = required("strategy")?;
        let strategy =
            MigrationStrategy::parse(raw_strategy).ok_or_else(|| MigrationError::UnknownStrategy {
                operation: op.id.to_string(),
                strategy: raw_strategy.to_string(),
            })?;

        Ok(Self {
            operation: op.id.clone(),
            database: required("database")?.to_string(),
            engine: required("engine")?.to_string(),
            path: PathBuf::from(required("path")?),
            strategy,
            connection_env: op.meta_str("conn_env").map(str::to_string),
        })
    }
}

/// A migration engine (raw SQL, a framework's migrator, ...).
#[async_trait]
pub trait Engine: Send + Sync {
    fn id(&self) -> &str;

    /// List migrations and whether each is applied.
    async fn plan(
        &self,
        request: &MigrationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Migration>, MigrationError>;

    /// Apply pending migrations. Must be idempotent.
    async fn apply(
        &self,
        request: &MigrationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), MigrationError>;
}

#[derive(Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn Engine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine: Arc<dyn Engine>) -> Result<(), MigrationError> {
        let id = engine.id().trim().to_string();
        if id.is_empty() {
            return Err(MigrationError::EmptyEngineId);
        }
        if self.engines.contains_key(&id) {
            return Err(MigrationError::DuplicateEngine(id));
        }
        self.engines.insert(id, engine);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Engine>, MigrationError> {
        self.engines
            .get(id)
            .cloned()
            .ok_or_else(|| MigrationError::UnknownEngine {
                engine: id.to_string(),
                available: self.ids(),
            })
    }

    pub fn has(&self, id: &str) -> bool {
        self.engines.contains_key(id)
    }

    /// Registered IDs, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.engines.keys().cloned().collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.ids())
            .finish()
    }
}

/// Applies a plan's migrations for one strategy, in plan order.
#[derive(Debug, Clone, Copy)]
pub struct MigrationRunner<'a> {
    registry: &'a EngineRegistry,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(registry: &'a EngineRegistry) -> Self {
        Self { registry }
    }

    /// Resolve every engine up front, then apply. Returns the applied operation IDs.
    pub async fn run(
        &self,
        plan: &Plan,
        strategy: MigrationStrategy,
        cancel: &CancellationToken,
    ) -> Result<Vec<OperationId>, MigrationError> {
        let work = plan
            .migrations(strategy)
            .map(|op| {
                let request = MigrationRequest::from_operation(op)?;
                let engine = self.registry.get(&request.engine)?;
                Ok((request, engine))
            })
            .collect::<Result<Vec<_>, MigrationError>>()?;

        let mut applied = Vec::with_capacity(work.len());
        for (request, engine) in work {
            if cancel.is_cancelled() {
                return Err(MigrationError::Cancelled);
            }
            tracing::info!(
                database = %request.database,
                engine = %request.engine,
                %strategy,
                "applying migrations"
            );
            engine.apply(&request, cancel).await?;
            applied.push(request.operation);
        }
        Ok(applied)
    }
}
