// ABOUTME: Plan and operation data model.
// ABOUTME: Operations reference their dependencies by ID, never by embedding.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::config::MigrationStrategy;
use crate::types::OperationId;

use super::PlanError;

/// A small closed set of metadata values. Keeps plans sortable and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Int(i64),
    List(Vec<String>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        MetadataValue::List(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::Int(i) => write!(f, "{i}"),
            MetadataValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Ordered metadata map; iteration order is part of the rendered output.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// The kind of work an operation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    InfraProvision,
    Migration,
    Build,
    Deploy,
    HealthCheck,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::InfraProvision => "infra_provision",
            OperationType::Migration => "migration",
            OperationType::Build => "build",
            OperationType::Deploy => "deploy",
            OperationType::HealthCheck => "health_check",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of planned work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub id: OperationId,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub description: String,
    /// IDs of operations that must complete first, sorted.
    pub dependencies: Vec<OperationId>,
    pub metadata: Metadata,
}

impl Operation {
    pub fn new(id: impl Into<OperationId>, kind: OperationType, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            description: description.into(),
            dependencies: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn depends_on(mut self, mut dependencies: Vec<OperationId>) -> Self {
        dependencies.sort();
        dependencies.dedup();
        self.dependencies = dependencies;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Metadata string value for a key, if present and a string.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }
}

/// An ordered, dependency-annotated set of operations for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub environment: String,
    pub operations: Vec<Operation>,
    pub metadata: Metadata,
}

impl Plan {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            operations: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn operation_ids(&self) -> Vec<&OperationId> {
        self.operations.iter().map(|op| &op.id).collect()
    }

    pub fn operations_of(&self, kind: OperationType) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }

    /// Migration operations planned for a strategy, in plan order.
    pub fn migrations(&self, strategy: MigrationStrategy) -> impl Iterator<Item = &Operation> {
        self.operations_of(OperationType::Migration)
            .filter(move |op| op.meta_str("strategy") == Some(strategy.as_str()))
    }

    /// Check the structural invariants: non-empty unique IDs, and every
    /// dependency names an operation that appears earlier.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.operations.len());

        for (index, op) in self.operations.iter().enumerate() {
            if op.id.is_empty() {
                return Err(PlanError::InternalInvariant(format!(
                    "operation at index {index} ({}) has an empty ID",
                    op.kind
                )));
            }
            for dep in &op.dependencies {
                if !seen.contains(dep.as_str()) {
                    return Err(PlanError::InternalInvariant(format!(
                        "operation {:?} depends on {:?} which is not planned before it",
                        op.id.as_str(),
                        dep.as_str()
                    )));
                }
            }
            if !seen.insert(op.id.as_str()) {
                return Err(PlanError::InternalInvariant(format!(
                    "duplicate operation ID {:?}",
                    op.id.as_str()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depends_on_sorts_and_dedups() {
        let op = Operation::new("deploy_prod", OperationType::Deploy, "Deploy").depends_on(vec![
            "migration_b_pre_deploy".into(),
            "build_backend".into(),
            "build_backend".into(),
        ]);
        let deps: Vec<_> = op.dependencies.iter().map(|d| d.as_str()).collect();
        assert_eq!(deps, ["build_backend", "migration_b_pre_deploy"]);
    }

    #[test]
    fn validate_rejects_empty_id() {
        let mut plan = Plan::new("prod");
        plan.operations
            .push(Operation::new("", OperationType::Build, "Build"));
        let err = plan.validate().unwrap_err();
        assert_eq!(err.code(), "internal_invariant");
        assert!(err.to_string().contains("empty ID"));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut plan = Plan::new("prod");
        plan.operations
            .push(Operation::new("build_backend", OperationType::Build, "Build"));
        plan.operations
            .push(Operation::new("build_backend", OperationType::Build, "Build"));
        assert!(plan.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_forward_dependency() {
        let mut plan = Plan::new("prod");
        plan.operations.push(
            Operation::new("deploy_prod", OperationType::Deploy, "Deploy")
                .depends_on(vec!["build_backend".into()]),
        );
        plan.operations
            .push(Operation::new("build_backend", OperationType::Build, "Build"));
        assert!(plan.validate().is_err());
    }

    #[test]
    fn metadata_value_serializes_untagged() {
        let op = Operation::new("x", OperationType::Build, "Build")
            .with_metadata("provider", "generic")
            .with_metadata("replicas", 3i64)
            .with_metadata("tags", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "build");
        assert_eq!(json["metadata"]["provider"], "generic");
        assert_eq!(json["metadata"]["replicas"], 3);
        assert_eq!(json["metadata"]["tags"][1], "b");
    }
}
