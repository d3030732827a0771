use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::pipeline::{MetricsSnapshot, PipelineMetrics};

pub fn log_snapshot(label: &str, snap: &MetricsSnapshot) {
    info!(
        records = snap.records_seen,
        audited = snap.audited,
        skipped = snap.skipped,
        malformed = snap.malformed,
        unparseable = snap.unparseable,
        not_auditable = snap.not_auditable,
        persisted = snap.persisted,
        persist_failures = snap.persist_failures,
        persist_timeouts = snap.persist_timeouts,
        in_flight = snap.in_flight,
        "{}",
        label
    );
}

/// Log pipeline counters every `interval_secs` until shutdown. 0 disables.
pub async fn report_stats(metrics: Arc<PipelineMetrics>, interval_secs: u64, mut shutdown: watch::Receiver<bool>) {
    if interval_secs == 0 {
        return;
    }

    let mut interval = time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => log_snapshot("Pipeline stats", &metrics.snapshot()),
            _ = shutdown.wait_for(|stop| *stop) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_reporter_returns() {
        let (_tx, rx) = watch::channel(false);
        time::timeout(Duration::from_millis(100), report_stats(Arc::new(PipelineMetrics::new()), 0, rx))
            .await
            .expect("disabled reporter should return at once");
    }

    #[tokio::test]
    async fn test_reporter_stops_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(report_stats(Arc::new(PipelineMetrics::new()), 3600, rx));
        tx.send(true).unwrap();
        time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reporter should stop")
            .unwrap();
    }
}
