// ABOUTME: Library root for stagecraft - planner, release state, phase executor, rollback, bootstrap.
// ABOUTME: The main binary is in main.rs.

pub mod bootstrap;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod migration;
pub mod network;
pub mod output;
pub mod plan;
pub mod ssh;
pub mod state;
pub mod types;
