// ABOUTME: Deployment planning: turns configuration into an ordered operation graph.
// ABOUTME: Pure and deterministic; plans are recomputed on demand and never persisted.

mod error;
mod model;
mod planner;
mod render;

pub use error::PlanError;
pub use model::{Metadata, MetadataValue, Operation, OperationType, Plan};
pub use planner::{BUILD_BACKEND_ID, Planner};
pub use render::{render_json, render_text};
