// ABOUTME: Per-host bootstrap state markers for the type state pattern.
// ABOUTME: Zero-sized types enforce the ssh -> docker -> network step order at compile time.

/// Nothing has run yet.
/// Available actions: `connect()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Start;

/// SSH probe succeeded.
/// Available actions: `ensure_docker()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Connected;

/// Docker present and verified, or disabled.
/// Available actions: `ensure_network()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerReady;

/// Every configured step succeeded.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Done;
