//! Source module — ingestion front ends.
//!
//! Each source only turns its input into records; classification and
//! persistence go through the shared [`AuditContext`](crate::state::AuditContext).

pub mod listener;
pub mod stream;

use thiserror::Error;
use tokio::sync::watch;

use crate::dispatch::DispatchError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Resolves once the shutdown flag is raised or its sender is gone.
pub(crate) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
