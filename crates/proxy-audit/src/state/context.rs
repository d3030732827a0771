//! Context — everything a source needs, built once at startup.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::conf::AuditConfig;
use crate::dispatch::{DispatchError, DispatchHandle};
use crate::filter::FilterError;
use crate::pipeline::{Engine, Outcome, PipelineMetrics};

pub struct AuditContext {
    pub config: AuditConfig,
    pub engine: Engine,
    pub metrics: Arc<PipelineMetrics>,
}

impl AuditContext {
    pub fn new(config: AuditConfig) -> Result<Self, FilterError> {
        let engine = Engine::new(config.filter.clone())?;
        Ok(Self {
            config,
            engine,
            metrics: Arc::new(PipelineMetrics::new()),
        })
    }

    /// Count and log one outcome, and enqueue it if it is an audit event.
    ///
    /// Only a closed queue is an error; every per-record failure ends here.
    pub async fn route(&self, outcome: Outcome, dispatch: &DispatchHandle) -> Result<(), DispatchError> {
        self.metrics.record_outcome(&outcome);

        match outcome {
            Outcome::Audit(event) => {
                debug!(
                    method = %event.method,
                    api = %event.route.api,
                    api_id = %event.route.api_id,
                    "Queueing audit event"
                );
                dispatch.submit(event).await?;
            }
            Outcome::Skipped(reason) => trace!("Skipped record: {}", reason),
            Outcome::Malformed(e) => debug!("Dropped record: {}", e),
            Outcome::Unparseable(e) => warn!(
                path = %e.path(),
                sections = e.segment_count(),
                "Unable to parse route: {}",
                e
            ),
            Outcome::NotAuditable(rejected) => info!("{}", rejected),
        }

        Ok(())
    }
}

pub type SharedContext = Arc<AuditContext>;
