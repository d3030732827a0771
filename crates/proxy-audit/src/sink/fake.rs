//! Fake — in-memory test double for the persistence port.
//!
//! Records every written event. Can be told to fail every write or to hold
//! writes until the test opens a gate, which lets tests saturate the queue.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};

use super::traits::{EventSink, SinkError, SinkFuture};
use crate::pipeline::AuditEvent;

#[derive(Default)]
pub struct FakeSink {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSink {
    /// A sink that accepts every write immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every write.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    /// A sink whose writes wait for a permit on the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let sink = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (sink, gate)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes started, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }
}

impl EventSink for FakeSink {
    fn write<'a>(&'a self, event: &'a AuditEvent) -> SinkFuture<'a> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|_| SinkError::Rejected("gate closed".to_string()))?;
                permit.forget();
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(SinkError::Rejected("fake sink set to fail".to_string()));
            }

            self.events.lock().await.push(event.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::ParsedRoute;
    use chrono::Utc;

    fn event() -> AuditEvent {
        AuditEvent {
            received_at: Utc::now(),
            auth_token: "AAAAAAAAAAAAAAAAAAAA".into(),
            ip: "10.0.0.1".into(),
            method: "PUT".into(),
            uid: None,
            route: ParsedRoute::default(),
        }
    }

    #[tokio::test]
    async fn test_records_writes() {
        let sink = FakeSink::new();
        sink.write(&event()).await.unwrap();
        sink.write(&event()).await.unwrap();
        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.attempts(), 2);
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = FakeSink::failing();
        assert!(matches!(sink.write(&event()).await, Err(SinkError::Rejected(_))));
        assert_eq!(sink.len().await, 0);
        assert_eq!(sink.attempts(), 1);

        sink.set_failing(false);
        assert!(sink.write(&event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_gated_sink_waits_for_permit() {
        let (sink, gate) = FakeSink::gated();
        let sink = Arc::new(sink);
        let writer = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { sink.write(&event()).await })
        };

        tokio::task::yield_now().await;
        assert_eq!(sink.len().await, 0);

        gate.add_permits(1);
        writer.await.unwrap().unwrap();
        assert_eq!(sink.len().await, 1);
    }
}
