//! Sink module — persistence port and its implementations.

pub mod fake;
pub mod sql;
pub mod traits;

pub use fake::FakeSink;
pub use sql::SqlSink;
pub use traits::{EventSink, SinkError};

pub type SharedSink = std::sync::Arc<dyn EventSink>;
