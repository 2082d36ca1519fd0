// ABOUTME: Rollback target selection and validation.
// ABOUTME: Resolves --to-previous/--to-release/--to-version against the release store.

use crate::state::{Release, ReleaseStore, StateError};
use crate::types::ReleaseId;

use super::error::RollbackError;

/// Which release to roll back to. Exactly one must be chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackTarget {
    /// The current release's `previous_id`.
    Previous,
    /// A specific release ID.
    Release(ReleaseId),
    /// The newest release in the environment with this version.
    Version(String),
}

impl RollbackTarget {
    /// Build a target from CLI flags. Empty strings count as unset.
    pub fn from_flags(
        to_previous: bool,
        to_release: Option<&str>,
        to_version: Option<&str>,
    ) -> Result<Self, RollbackError> {
        let to_release = to_release.map(str::trim).filter(|s| !s.is_empty());
        let to_version = to_version.map(str::trim).filter(|s| !s.is_empty());

        let chosen =
            usize::from(to_previous) + usize::from(to_release.is_some()) + usize::from(to_version.is_some());
        if chosen == 0 {
            return Err(RollbackError::UserInput(
                "rollback target required; use --to-previous, --to-release, or --to-version"
                    .to_string(),
            ));
        }
        if chosen > 1 {
            return Err(RollbackError::UserInput(
                "only one rollback target flag may be specified".to_string(),
            ));
        }

        Ok(match (to_release, to_version) {
            (Some(id), _) => RollbackTarget::Release(ReleaseId::new(id)),
            (_, Some(version)) => RollbackTarget::Version(version.to_string()),
            _ => RollbackTarget::Previous,
        })
    }
}

/// Resolves rollback targets. Never mutates the store.
pub struct Resolver<'a> {
    store: &'a ReleaseStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a ReleaseStore) -> Self {
        Self { store }
    }

    /// Find the target release relative to `current` and check it is usable.
    pub fn resolve(&self, current: &Release, target: &RollbackTarget) -> Result<Release, RollbackError> {
        let found = self.find(current, target)?;
        validate_target(current, &found)?;
        Ok(found)
    }

    fn find(&self, current: &Release, target: &RollbackTarget) -> Result<Release, RollbackError> {
        match target {
            RollbackTarget::Previous => {
                let previous = current
                    .previous_id
                    .as_ref()
                    .ok_or_else(|| RollbackError::NoPreviousRelease(current.id.to_string()))?;
                self.get(previous.as_str())
            }
            RollbackTarget::Release(id) => {
                let release = self.get(id.as_str())?;
                if release.environment != current.environment {
                    return Err(RollbackError::EnvironmentMismatch {
                        id: id.to_string(),
                        actual: release.environment,
                        expected: current.environment.clone(),
                    });
                }
                Ok(release)
            }
            RollbackTarget::Version(version) => self
                .store
                .list_releases(&current.environment)?
                .into_iter()
                .find(|r| r.version == *version)
                .ok_or_else(|| RollbackError::NoMatchingVersion {
                    version: version.clone(),
                    environment: current.environment.clone(),
                }),
        }
    }

    fn get(&self, id: &str) -> Result<Release, RollbackError> {
        self.store.get_release(id).map_err(|e| match e {
            StateError::ReleaseNotFound(id) => RollbackError::TargetNotFound(id),
            other => RollbackError::State(other),
        })
    }
}

/// A target must differ from the current release and have every phase completed.
pub fn validate_target(current: &Release, target: &Release) -> Result<(), RollbackError> {
    if target.id == current.id {
        return Err(RollbackError::CannotRollbackToCurrent(target.id.to_string()));
    }

    let incomplete = target.incomplete_phases();
    if !incomplete.is_empty() {
        return Err(RollbackError::TargetNotFullyDeployed {
            id: target.id.to_string(),
            phases: incomplete,
        });
    }

    Ok(())
}
