// ABOUTME: Type-safe identifiers shared across planning, release state, and bootstrap.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;

pub use id::{HostId, Id, OperationId, ReleaseId};
