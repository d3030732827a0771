//! State module — the shared audit context.

pub mod context;

pub use context::{AuditContext, SharedContext};
