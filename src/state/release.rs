// ABOUTME: Release record, the fixed deployment phase sequence, and phase statuses.
// ABOUTME: Phase order is declaration order; the phase map iterates in that order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::ReleaseId;

/// One stage of a release, in fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Build,
    Push,
    MigratePre,
    Rollout,
    MigratePost,
    Finalize,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 6] = [
        Phase::Build,
        Phase::Push,
        Phase::MigratePre,
        Phase::Rollout,
        Phase::MigratePost,
        Phase::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Build => "build",
            Phase::Push => "push",
            Phase::MigratePre => "migrate_pre",
            Phase::Rollout => "rollout",
            Phase::MigratePost => "migrate_post",
            Phase::Finalize => "finalize",
        }
    }

    /// Phases that come after this one.
    pub fn downstream(&self) -> &'static [Phase] {
        let index = Phase::ALL
            .iter()
            .position(|p| p == self)
            .unwrap_or(Phase::ALL.len() - 1);
        &Phase::ALL[index + 1..]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::Running => "running",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PhaseStatus::Completed | PhaseStatus::Failed | PhaseStatus::Skipped
        )
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deployment attempt for an environment.
///
/// Values handed out by the store are snapshots; mutate only through
/// [`ReleaseStore`](super::ReleaseStore) methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub environment: String,
    pub version: String,
    #[serde(default)]
    pub commit_sha: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub phases: BTreeMap<Phase, PhaseStatus>,
    /// The release that was current for the environment when this one was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<ReleaseId>,
}

impl Release {
    /// Status of a phase; phases missing from the map read as pending.
    pub fn phase_status(&self, phase: Phase) -> PhaseStatus {
        self.phases
            .get(&phase)
            .copied()
            .unwrap_or(PhaseStatus::Pending)
    }

    /// Phases not yet `completed`, in execution order.
    pub fn incomplete_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| self.phase_status(*p) != PhaseStatus::Completed)
            .collect()
    }

    pub fn is_fully_deployed(&self) -> bool {
        self.incomplete_phases().is_empty()
    }

    pub fn has_failed(&self) -> bool {
        self.phases.values().any(|s| *s == PhaseStatus::Failed)
    }
}
