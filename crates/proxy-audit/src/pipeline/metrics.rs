use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::outcome::Outcome;

/// A wrapper that forces the wrapped data onto its own cache line.
///
/// Sources and workers update different groups concurrently; keeping each
/// group on a separate 64-byte line avoids false sharing between them.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Classification counters (updated by the sources, once per record)
#[derive(Debug, Default)]
pub struct ClassifyMetrics {
    pub seen: AtomicU64,
    pub audited: AtomicU64,
    pub skipped: AtomicU64,
    pub malformed: AtomicU64,
    pub unparseable: AtomicU64,
    pub not_auditable: AtomicU64,
}

/// Dispatch counters (updated by the workers)
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub queued: AtomicU64,
    pub persisted: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
}

/// Pipeline counters.
///
/// All operations use `Ordering::Relaxed`; a snapshot is not transactional
/// across fields.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub classify: CacheAligned<ClassifyMetrics>,
    pub dispatch: CacheAligned<DispatchMetrics>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_outcome(&self, outcome: &Outcome) {
        let c = &self.classify.0;
        c.seen.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Audit(_) => &c.audited,
            Outcome::Skipped(_) => &c.skipped,
            Outcome::Malformed(_) => &c.malformed,
            Outcome::Unparseable(_) => &c.unparseable,
            Outcome::NotAuditable(_) => &c.not_auditable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_queued(&self) {
        self.dispatch.0.queued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_persisted(&self) {
        self.dispatch.0.persisted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.dispatch.0.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_timeout(&self) {
        self.dispatch.0.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.classify.0;
        let d = &self.dispatch.0;

        let queued = d.queued.load(Ordering::Relaxed);
        let persisted = d.persisted.load(Ordering::Relaxed);
        let failed = d.failed.load(Ordering::Relaxed);
        let timed_out = d.timed_out.load(Ordering::Relaxed);

        MetricsSnapshot {
            records_seen: c.seen.load(Ordering::Relaxed),
            audited: c.audited.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
            malformed: c.malformed.load(Ordering::Relaxed),
            unparseable: c.unparseable.load(Ordering::Relaxed),
            not_auditable: c.not_auditable.load(Ordering::Relaxed),
            queued,
            persisted,
            persist_failures: failed,
            persist_timeouts: timed_out,
            in_flight: queued.saturating_sub(persisted + failed + timed_out),
        }
    }
}

/// A read-only snapshot of pipeline counters, logged by the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_seen: u64,
    pub audited: u64,
    pub skipped: u64,
    pub malformed: u64,
    pub unparseable: u64,
    pub not_auditable: u64,
    pub queued: u64,
    pub persisted: u64,
    pub persist_failures: u64,
    pub persist_timeouts: u64,
    /// Queued but not yet finished (approximate)
    pub in_flight: u64,
}
