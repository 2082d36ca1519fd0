// ABOUTME: Error types for migration engines and the migration runner.
// ABOUTME: Planned-operation problems are invariant violations; unknown engines are config errors.

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("operation {0} is not a migration")]
    NotMigration(String),

    #[error("migration operation {operation} is missing metadata {key:?}")]
    MissingMetadata { operation: String, key: &'static str },

    #[error("migration operation {operation} has unknown strategy {strategy:?}")]
    UnknownStrategy { operation: String, strategy: String },

    #[error("unknown migration engine {engine:?} (available: {})", .available.join(", "))]
    UnknownEngine {
        engine: String,
        available: Vec<String>,
    },

    #[error("migration engine id must not be empty")]
    EmptyEngineId,

    #[error("migration engine {0:?} already registered")]
    DuplicateEngine(String),

    #[error("migration engine {engine} failed for database {database}: {message}")]
    Engine {
        engine: String,
        database: String,
        message: String,
    },

    #[error("migrations cancelled")]
    Cancelled,
}

impl MigrationError {
    pub fn code(&self) -> &'static str {
        match self {
            MigrationError::NotMigration(_)
            | MigrationError::MissingMetadata { .. }
            | MigrationError::UnknownStrategy { .. } => "internal_invariant",
            MigrationError::UnknownEngine { .. } => "config_invalid",
            MigrationError::EmptyEngineId | MigrationError::DuplicateEngine(_) => {
                "invalid_registration"
            }
            MigrationError::Engine { .. } => "migration_failed",
            MigrationError::Cancelled => "cancelled",
        }
    }
}
