// ABOUTME: Durable release state: releases, their phase statuses, and the current pointer.
// ABOUTME: Persisted as JSON with atomic temp-file-then-rename writes.

mod error;
mod release;
mod store;

pub use error::StateError;
pub use release::{Phase, PhaseStatus, Release};
pub use store::{DEFAULT_STATE_PATH, ReleaseStore, STATE_FILE_ENV};
