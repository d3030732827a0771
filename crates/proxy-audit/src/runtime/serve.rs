//! Serve — start the dispatcher and sources, run until done or signalled,
//! then drain.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::dispatch::{DispatchSettings, Dispatcher, DrainReport};
use crate::runtime::report::{log_snapshot, report_stats};
use crate::runtime::stop::{shutdown_channel, shutdown_signal};
use crate::sink::SharedSink;
use crate::source::{listener, stream, SourceError};
use crate::state::SharedContext;

async fn join_sources(sources: &mut JoinSet<Result<(), SourceError>>) {
    while let Some(done) = sources.join_next().await {
        match done {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Source failed: {}", e),
            Err(e) => error!("Source task failed: {}", e),
        }
    }
}

/// Run every configured source against one shared dispatcher.
///
/// Returns when all sources have finished (stdin EOF) or on Ctrl+C/SIGTERM.
/// Either way the queue is drained before the sink is closed.
pub async fn serve(ctx: SharedContext, sink: SharedSink) -> Result<DrainReport, Box<dyn std::error::Error>> {
    serve_until(ctx, sink, shutdown_signal()).await
}

pub async fn serve_until<F>(
    ctx: SharedContext,
    sink: SharedSink,
    shutdown: F,
) -> Result<DrainReport, Box<dyn std::error::Error>>
where
    F: Future<Output = ()>,
{
    let config = &ctx.config;
    let (stop_tx, stop_rx) = shutdown_channel();

    // Bind before anything is read so a bad address fails the process early.
    let tcp = if config.mode.listens() {
        Some(listener::bind(&config.listen_address()).await?)
    } else {
        None
    };

    let dispatcher = Dispatcher::start(sink.clone(), ctx.metrics.clone(), DispatchSettings::from(config));
    let handle = dispatcher.handle()?;

    let mut sources = JoinSet::new();
    if config.mode.reads_stdin() {
        let (ctx, handle, stop) = (ctx.clone(), handle.clone(), stop_rx.clone());
        sources.spawn(async move { stream::run_stdin(ctx, handle, stop).await.map(|_| ()) });
    }
    if let Some(tcp) = tcp {
        sources.spawn(listener::run_listener(tcp, ctx.clone(), handle.clone(), stop_rx.clone()));
    }
    drop(handle);

    let reporter = tokio::spawn(report_stats(ctx.metrics.clone(), config.stats_interval_secs, stop_rx));

    info!("proxy-audit is running (mode: {})", config.mode);

    tokio::select! {
        _ = shutdown => {}
        _ = join_sources(&mut sources) => info!("All sources finished"),
    }

    let _ = stop_tx.send(true);
    join_sources(&mut sources).await;

    let report = dispatcher.shutdown().await;
    if let Err(e) = reporter.await {
        error!("Stats reporter failed: {}", e);
    }
    log_snapshot("Final pipeline stats", &ctx.metrics.snapshot());

    sink.close().await;
    info!("Shutdown complete");
    Ok(report)
}
