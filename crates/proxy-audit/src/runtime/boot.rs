//! Boot — config load, database connection, context creation.

use std::sync::Arc;

use tracing::{error, info};

use crate::conf::{AuditConfig, ConfigError};
use crate::sink::{SharedSink, SqlSink};
use crate::state::{AuditContext, SharedContext};

/// Load and validate the configuration.
pub fn load_config() -> Result<AuditConfig, ConfigError> {
    let config = AuditConfig::load()?;
    config.validate().map_err(|e| {
        error!("Configuration rejected: {}", e);
        ConfigError::Invalid(e)
    })?;
    Ok(config)
}

/// Load config, connect to the database, build the shared context.
///
/// Any failure here aborts the process before ingestion starts.
pub async fn boot() -> Result<(SharedContext, SharedSink), Box<dyn std::error::Error>> {
    info!("Starting proxy-audit v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        "Loaded configuration: mode={}, table={}, workers={}, queue_depth={}",
        config.mode, config.event_table, config.workers, config.queue_depth
    );

    let sink = SqlSink::connect(&config.connection_string, &config.event_table)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;
    info!("Successfully connected to database");

    let ctx = Arc::new(AuditContext::new(config)?);
    Ok((ctx, Arc::new(sink)))
}
