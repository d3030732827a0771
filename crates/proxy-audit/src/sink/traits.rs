//! Persistence port — abstract interface for storing audit events.
//!
//! `sql.rs` provides the PostgreSQL implementation.
//! `fake.rs` provides a test double.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::AuditEvent;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    #[error("write rejected: {0}")]
    Rejected(String),
}

pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// Durable destination for audit events.
///
/// Object-safe so the dispatcher can hold an `Arc<dyn EventSink>`.
pub trait EventSink: Send + Sync {
    fn write<'a>(&'a self, event: &'a AuditEvent) -> SinkFuture<'a>;

    /// Release connections. Called once after the dispatcher has drained.
    fn close(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}
