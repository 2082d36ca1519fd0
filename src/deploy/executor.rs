// ABOUTME: Phase executor that drives a release through build..finalize in order.
// ABOUTME: Records running/completed/failed per phase and skips everything downstream of a failure.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostics, Warning};
use crate::plan::Plan;
use crate::state::{Phase, PhaseStatus, Release, ReleaseStore};

use super::error::{ExecuteError, PhaseError};

/// Everything a phase function gets to see.
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    pub release: &'a Release,
    pub plan: &'a Plan,
    pub cancel: &'a CancellationToken,
    pub phase: Phase,
}

/// One function per phase. Implementations should return promptly once
/// `cx.cancel` fires.
#[async_trait]
pub trait PhaseFns: Send + Sync {
    async fn build(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
    async fn push(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
    async fn migrate_pre(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
    async fn rollout(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
    async fn migrate_post(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
    async fn finalize(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError>;
}

async fn call_phase<F: PhaseFns + ?Sized>(fns: &F, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
    match cx.phase {
        Phase::Build => fns.build(cx).await,
        Phase::Push => fns.push(cx).await,
        Phase::MigratePre => fns.migrate_pre(cx).await,
        Phase::Rollout => fns.rollout(cx).await,
        Phase::MigratePost => fns.migrate_post(cx).await,
        Phase::Finalize => fns.finalize(cx).await,
    }
}

enum Outcome {
    Completed,
    Failed(PhaseError),
    Cancelled,
}

/// Runs the six phases of a release against a store.
pub struct PhaseExecutor<'a, F: ?Sized> {
    store: &'a ReleaseStore,
    fns: &'a F,
}

impl<'a, F: PhaseFns + ?Sized> PhaseExecutor<'a, F> {
    pub fn new(store: &'a ReleaseStore, fns: &'a F) -> Self {
        Self { store, fns }
    }

    /// Execute every phase of `release` in order and return the final record.
    ///
    /// On failure the failing phase is marked `failed` and every later phase
    /// `skipped`. Cancellation between phases skips the remainder; cancellation
    /// during a phase marks it `failed`.
    pub async fn execute(
        &self,
        release: &Release,
        plan: &Plan,
        cancel: &CancellationToken,
        diagnostics: &mut Diagnostics,
    ) -> Result<Release, ExecuteError> {
        let id = release.id.as_str();

        for phase in Phase::ALL {
            if cancel.is_cancelled() {
                tracing::warn!(release = id, %phase, "cancelled before phase");
                let remaining: Vec<Phase> =
                    Phase::ALL.into_iter().filter(|p| *p >= phase).collect();
                self.mark_skipped(id, &remaining, diagnostics);
                return Err(ExecuteError::Cancelled {
                    release: id.to_string(),
                    phase,
                });
            }

            tracing::info!(release = id, %phase, "starting phase");
            self.store.update_phase(id, phase, PhaseStatus::Running)?;

            let cx = PhaseContext {
                release,
                plan,
                cancel,
                phase,
            };
            let outcome = tokio::select! {
                biased;
                result = call_phase(self.fns, cx) => match result {
                    Ok(()) => Outcome::Completed,
                    Err(e) => Outcome::Failed(e),
                },
                _ = cancel.cancelled() => Outcome::Cancelled,
            };

            match outcome {
                Outcome::Completed => {
                    self.store
                        .update_phase(id, phase, PhaseStatus::Completed)?;
                    tracing::info!(release = id, %phase, "phase completed");
                }
                Outcome::Failed(source) => {
                    tracing::error!(release = id, %phase, error = %source, "phase failed");
                    self.mark_failed(id, phase, diagnostics);
                    return Err(ExecuteError::PhaseFailed {
                        release: id.to_string(),
                        phase,
                        source,
                    });
                }
                Outcome::Cancelled => {
                    tracing::warn!(release = id, %phase, "cancelled during phase");
                    self.mark_failed(id, phase, diagnostics);
                    return Err(ExecuteError::Cancelled {
                        release: id.to_string(),
                        phase,
                    });
                }
            }
        }

        Ok(self.store.get_release(id)?)
    }

    fn mark_failed(&self, id: &str, phase: Phase, diagnostics: &mut Diagnostics) {
        if let Err(e) = self.store.update_phase(id, phase, PhaseStatus::Failed) {
            diagnostics.warn(Warning::phase_status(format!(
                "could not mark phase {phase} failed for release {id}: {e}"
            )));
        }
        self.mark_skipped(id, phase.downstream(), diagnostics);
    }

    fn mark_skipped(&self, id: &str, phases: &[Phase], diagnostics: &mut Diagnostics) {
        for &phase in phases {
            if let Err(e) = self.store.update_phase(id, phase, PhaseStatus::Skipped) {
                diagnostics.warn(Warning::phase_status(format!(
                    "could not mark phase {phase} skipped for release {id}: {e}"
                )));
            }
        }
    }
}
