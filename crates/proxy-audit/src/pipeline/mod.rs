//! Pipeline module — the shared engine, its outcomes and counters.

pub mod engine;
pub mod event;
pub mod metrics;
pub mod outcome;

pub use engine::Engine;
pub use event::AuditEvent;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use outcome::Outcome;
