// ABOUTME: File-backed release store with a per-environment current pointer.
// ABOUTME: Every mutation is load-modify-save under a mutex, saved via temp file + rename.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::ReleaseId;

use super::{Phase, PhaseStatus, Release, StateError};

/// Default location of the state file, relative to the project root.
pub const DEFAULT_STATE_PATH: &str = ".stagecraft/releases.json";

/// Environment variable overriding the state file location.
pub const STATE_FILE_ENV: &str = "STAGECRAFT_STATE_FILE";

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// On-disk schema. Field names are stable; rollback reads old records verbatim.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    /// Every release ever created, in creation order.
    #[serde(default)]
    releases: Vec<Release>,
    /// Current release per environment.
    #[serde(default)]
    current: BTreeMap<String, ReleaseId>,
}

impl StateFile {
    fn find(&self, id: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Release> {
        self.releases.iter_mut().find(|r| r.id == id)
    }

    fn current(&self, env: &str) -> Option<&Release> {
        match self.current.get(env) {
            Some(id) => self.find(id.as_str()),
            // Files written without a pointer: newest release for the environment wins.
            None => self.releases.iter().rev().find(|r| r.environment == env),
        }
    }
}

/// Durable store of releases, keyed by environment.
///
/// A single process should own the state file at a time; concurrent CLI
/// invocations are not coordinated beyond the atomic rename.
pub struct ReleaseStore {
    path: PathBuf,
    clock: Clock,
    lock: Mutex<()>,
}

impl std::fmt::Debug for ReleaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseStore")
            .field("path", &self.path)
            .finish()
    }
}

impl ReleaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            clock: Box::new(Utc::now),
            lock: Mutex::new(()),
        }
    }

    /// Store at `$STAGECRAFT_STATE_FILE`, or [`DEFAULT_STATE_PATH`] under `project_dir`.
    pub fn for_project(project_dir: &Path) -> Self {
        match std::env::var_os(STATE_FILE_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::new(project_dir.join(DEFAULT_STATE_PATH)),
        }
    }

    /// Replace the clock used for release timestamps and IDs.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a release that becomes current for `env`, with every phase pending.
    pub fn create_release(
        &self,
        env: &str,
        version: &str,
        commit_sha: &str,
    ) -> Result<Release, StateError> {
        let env = env.trim();
        let version = version.trim();
        let commit_sha = commit_sha.trim();

        if env.is_empty() {
            return Err(StateError::InvalidInput(
                "environment must not be empty".to_string(),
            ));
        }
        if version.is_empty() {
            return Err(StateError::InvalidInput(
                "version must not be empty".to_string(),
            ));
        }

        let _guard = self.lock.lock();
        let mut state = self.load()?;

        let now = (self.clock)();
        let id = unique_release_id(&state, now);
        let previous_id = state.current(env).map(|r| r.id.clone());

        let release = Release {
            id: id.clone(),
            environment: env.to_string(),
            version: version.to_string(),
            commit_sha: commit_sha.to_string(),
            created_at: now,
            phases: Phase::ALL
                .into_iter()
                .map(|p| (p, PhaseStatus::Pending))
                .collect(),
            previous_id,
        };

        state.releases.push(release.clone());
        state.current.insert(env.to_string(), id);
        self.save(&state)?;

        tracing::info!(
            release = %release.id,
            environment = env,
            version,
            "created release"
        );
        Ok(release)
    }

    /// The current release for `env`.
    pub fn current_release(&self, env: &str) -> Result<Release, StateError> {
        let _guard = self.lock.lock();
        let state = self.load()?;
        state
            .current(env)
            .cloned()
            .ok_or_else(|| StateError::NoCurrentRelease(env.to_string()))
    }

    pub fn get_release(&self, id: &str) -> Result<Release, StateError> {
        let _guard = self.lock.lock();
        let state = self.load()?;
        state
            .find(id)
            .cloned()
            .ok_or_else(|| StateError::ReleaseNotFound(id.to_string()))
    }

    /// Releases for `env`, newest first.
    pub fn list_releases(&self, env: &str) -> Result<Vec<Release>, StateError> {
        let _guard = self.lock.lock();
        let state = self.load()?;
        Ok(state
            .releases
            .iter()
            .rev()
            .filter(|r| r.environment == env)
            .cloned()
            .collect())
    }

    /// Every release, grouped by environment (ascending), newest first within each.
    pub fn list_all_releases(&self) -> Result<Vec<Release>, StateError> {
        let _guard = self.lock.lock();
        let state = self.load()?;
        let mut releases: Vec<Release> = state.releases.into_iter().rev().collect();
        // Stable sort keeps newest-first order within an environment.
        releases.sort_by(|a, b| a.environment.cmp(&b.environment));
        Ok(releases)
    }

    /// Record a phase status. Ordering of transitions is the caller's concern.
    pub fn update_phase(
        &self,
        release_id: &str,
        phase: Phase,
        status: PhaseStatus,
    ) -> Result<(), StateError> {
        let _guard = self.lock.lock();
        let mut state = self.load()?;

        let release = state
            .find_mut(release_id)
            .ok_or_else(|| StateError::ReleaseNotFound(release_id.to_string()))?;
        release.phases.insert(phase, status);

        self.save(&state)?;
        tracing::debug!(release = release_id, %phase, %status, "updated phase");
        Ok(())
    }

    fn load(&self) -> Result<StateFile, StateError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StateFile::default());
            }
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, state: &StateFile) -> Result<(), StateError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| StateError::io(dir, e))?;
        }

        let mut data = serde_json::to_vec_pretty(state).map_err(StateError::Serialize)?;
        data.push(b'\n');

        // PID suffix keeps two processes from sharing a temp file.
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(format!(".{}.tmp", std::process::id()));
        let tmp = PathBuf::from(tmp);

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&data)?;
            file.sync_all()
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(StateError::io(&tmp, e));
        }

        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StateError::io(&self.path, e));
        }

        Ok(())
    }
}

/// `rel-YYYYMMDD-HHMMSSmmm`, suffixed with `-N` if that ID is taken.
fn unique_release_id(state: &StateFile, now: DateTime<Utc>) -> ReleaseId {
    let base = format!("rel-{}", now.format("%Y%m%d-%H%M%S%3f"));
    if state.find(&base).is_none() {
        return ReleaseId::new(base);
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if state.find(&candidate).is_none() {
            return ReleaseId::new(candidate);
        }
        n += 1;
    }
}
