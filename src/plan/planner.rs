// ABOUTME: Planner that converts configuration into a deterministic deployment plan.
// ABOUTME: Every map-derived collection is sorted before operations are emitted.

use crate::config::{Config, MigrationStrategy};
use crate::types::OperationId;

use super::{Operation, OperationType, Plan, PlanError};

/// ID of the backend build operation.
pub const BUILD_BACKEND_ID: &str = "build_backend";

/// Creates deployment plans from configuration. Performs no I/O.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    config: &'a Config,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Plan a deploy to `environment`.
    ///
    /// Order is fixed: pre-deploy migrations, backend build, deploy,
    /// post-deploy migrations, health check.
    pub fn plan_deploy(&self, environment: &str) -> Result<Plan, PlanError> {
        let env_config = self
            .config
            .environment(environment)
            .ok_or_else(|| PlanError::UnknownEnvironment(environment.to_string()))?;

        let mut plan = Plan::new(environment);
        if let Some(path) = &self.config.path {
            plan.metadata
                .insert("config_path".to_string(), path.display().to_string().into());
        }

        let pre_deploy = self.migration_ops(MigrationStrategy::PreDeploy);
        let pre_deploy_ids: Vec<OperationId> = pre_deploy.iter().map(|op| op.id.clone()).collect();
        plan.operations.extend(pre_deploy);

        let mut deploy_deps = pre_deploy_ids;
        if let Some(build) = self.build_op() {
            deploy_deps.push(build.id.clone());
            plan.operations.push(build);
        }

        let deploy_id = OperationId::new(format!("deploy_{environment}"));
        plan.operations.push(
            Operation::new(
                deploy_id.clone(),
                OperationType::Deploy,
                format!("Deploy to environment {environment}"),
            )
            .depends_on(deploy_deps)
            .with_metadata("environment", environment)
            .with_metadata("driver", env_config.driver.as_str()),
        );

        // Post-deploy migrations run after rollout by phase ordering, not by edges.
        plan.operations
            .extend(self.migration_ops(MigrationStrategy::PostDeploy));

        plan.operations.push(
            Operation::new(
                format!("health_check_{environment}"),
                OperationType::HealthCheck,
                format!("Health check for environment {environment}"),
            )
            .depends_on(vec![deploy_id])
            .with_metadata("environment", environment),
        );

        plan.validate()?;

        tracing::debug!(
            environment,
            operations = plan.operations.len(),
            "computed deployment plan"
        );
        Ok(plan)
    }

    fn migration_ops(&self, strategy: MigrationStrategy) -> Vec<Operation> {
        let mut databases: Vec<_> = self
            .config
            .databases
            .iter()
            .filter_map(|(name, db)| {
                db.migrations
                    .as_ref()
                    .filter(|m| m.strategy == Some(strategy))
                    .map(|m| (name, db, m))
            })
            .collect();
        databases.sort_by(|a, b| a.0.cmp(b.0));

        databases
            .into_iter()
            .map(|(name, db, migrations)| {
                let mut op = Operation::new(
                    format!("migration_{name}_{strategy}"),
                    OperationType::Migration,
                    format!("Run {strategy} migrations for database {name}"),
                )
                .with_metadata("database", name.as_str())
                .with_metadata("strategy", strategy.as_str())
                .with_metadata("engine", migrations.engine.as_str())
                .with_metadata("path", migrations.path.as_str());
                if let Some(conn_env) = &db.connection_env {
                    op = op.with_metadata("conn_env", conn_env.as_str());
                }
                op
            })
            .collect()
    }

    fn build_op(&self) -> Option<Operation> {
        self.config.backend.as_ref().map(|backend| {
            Operation::new(
                BUILD_BACKEND_ID,
                OperationType::Build,
                format!("Build backend using provider {}", backend.provider),
            )
            .with_metadata("provider", backend.provider.as_str())
        })
    }
}
