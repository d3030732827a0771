//! Pool — bounded queue feeding a fixed set of persistence workers.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::conf::AuditConfig;
use crate::pipeline::{AuditEvent, PipelineMetrics};
use crate::sink::{SharedSink, SinkError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatch queue is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub workers: usize,
    pub queue_depth: usize,
    pub persist_timeout: Duration,
    pub drain_timeout: Duration,
}

impl From<&AuditConfig> for DispatchSettings {
    fn from(config: &AuditConfig) -> Self {
        Self {
            workers: config.workers,
            queue_depth: config.queue_depth,
            persist_timeout: Duration::from_millis(config.persist_timeout_ms),
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
        }
    }
}

/// Producer side of the queue. Cheap to clone; one per source.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<AuditEvent>,
    metrics: Arc<PipelineMetrics>,
}

impl DispatchHandle {
    /// Enqueue an event, waiting while the queue is full.
    pub async fn submit(&self, event: AuditEvent) -> Result<(), DispatchError> {
        self.tx.send(event).await.map_err(|_| DispatchError::Closed)?;
        self.metrics.record_queued();
        Ok(())
    }

    /// Free slots in the queue right now.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// How a shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub aborted: usize,
}

pub struct Dispatcher {
    tx: Option<mpsc::Sender<AuditEvent>>,
    metrics: Arc<PipelineMetrics>,
    workers: JoinSet<()>,
    drain_timeout: Duration,
}

impl Dispatcher {
    /// Spawn `settings.workers` workers on the current runtime.
    pub fn start(sink: SharedSink, metrics: Arc<PipelineMetrics>, settings: DispatchSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for id in 0..settings.workers.max(1) {
            workers.spawn(worker(
                id,
                Arc::clone(&rx),
                Arc::clone(&sink),
                Arc::clone(&metrics),
                settings.persist_timeout,
            ));
        }

        info!(
            "Dispatcher started: {} workers, queue depth {}, persist timeout {:?}",
            settings.workers, settings.queue_depth, settings.persist_timeout
        );

        Self {
            tx: Some(tx),
            metrics,
            workers,
            drain_timeout: settings.drain_timeout,
        }
    }

    pub fn handle(&self) -> Result<DispatchHandle, DispatchError> {
        let tx = self.tx.as_ref().ok_or(DispatchError::Closed)?;
        Ok(DispatchHandle {
            tx: tx.clone(),
            metrics: Arc::clone(&self.metrics),
        })
    }

    /// Close the queue and wait for workers to finish what is queued.
    ///
    /// The queue only closes once every [`DispatchHandle`] is dropped too, so
    /// sources must be stopped first. Workers still running after the drain
    /// timeout are aborted.
    pub async fn shutdown(mut self) -> DrainReport {
        drop(self.tx.take());

        let mut report = DrainReport { completed: 0, aborted: 0 };
        let deadline = time::sleep(self.drain_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = self.workers.join_next() => match joined {
                    None => break,
                    Some(Ok(())) => report.completed += 1,
                    Some(Err(e)) => {
                        error!("Dispatch worker failed: {}", e);
                        report.completed += 1;
                    }
                },
                _ = &mut deadline => {
                    report.aborted = self.workers.len();
                    warn!(
                        "Drain timeout after {:?}; aborting {} workers",
                        self.drain_timeout, report.aborted
                    );
                    self.workers.abort_all();
                    while self.workers.join_next().await.is_some() {}
                    break;
                }
            }
        }

        info!("Dispatcher stopped ({} workers drained, {} aborted)", report.completed, report.aborted);
        report
    }
}

async fn worker(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<AuditEvent>>>,
    sink: SharedSink,
    metrics: Arc<PipelineMetrics>,
    persist_timeout: Duration,
) {
    loop {
        let next = { rx.lock().await.recv().await };
        let Some(event) = next else {
            debug!("Worker {} exiting: queue closed", id);
            return;
        };

        match time::timeout(persist_timeout, sink.write(&event)).await {
            Ok(Ok(())) => metrics.record_persisted(),
            Ok(Err(e)) => {
                metrics.record_failed();
                error!("Failed to persist event {} {}: {}", event.method, event.route.api, e);
            }
            Err(_) => {
                metrics.record_timeout();
                error!(
                    "Failed to persist event {} {}: {}",
                    event.method,
                    event.route.api,
                    SinkError::Timeout(persist_timeout)
                );
            }
        }
    }
}
