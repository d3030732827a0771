//! Stream — one access-log record per line on stdin.

use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tracing::{info, warn};

use super::{stopped, SourceError};
use crate::dispatch::DispatchHandle;
use crate::pipeline::Outcome;
use crate::record::RecordError;
use crate::state::SharedContext;

pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Read stdin until EOF or shutdown.
pub async fn run_stdin(
    ctx: SharedContext,
    dispatch: DispatchHandle,
    shutdown: watch::Receiver<bool>,
) -> Result<u64, SourceError> {
    info!("Reading access log records from stdin");
    let lines = run_reader(tokio::io::stdin(), &ctx, &dispatch, shutdown).await?;
    info!("Stdin source finished after {} lines", lines);
    Ok(lines)
}

/// Feed every line of `reader` through the engine. Returns the line count.
///
/// Invalid UTF-8 is replaced rather than rejected so one bad byte does not
/// end the stream. A line longer than [`MAX_LINE_LENGTH`] is discarded up to
/// its newline and counted as malformed.
pub async fn run_reader<R>(
    reader: R,
    ctx: &SharedContext,
    dispatch: &DispatchHandle,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, SourceError>
where
    R: AsyncRead + Unpin,
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_LENGTH);
    let mut chunks = FramedRead::new(reader, codec);
    let mut lines: u64 = 0;
    // FramedRead yields one `None` after a decode error before resuming.
    let mut resume = false;

    loop {
        let chunk = tokio::select! {
            chunk = chunks.next() => chunk,
            _ = stopped(&mut shutdown) => {
                info!("Shutdown requested; stream source stopping");
                break;
            }
        };

        let outcome = match chunk {
            None if resume => {
                resume = false;
                continue;
            }
            None => break,
            Some(Ok(bytes)) => {
                resume = false;
                ctx.engine.process_line(&String::from_utf8_lossy(&bytes))
            }
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                resume = true;
                warn!("Stdin line exceeds {} bytes; discarded", MAX_LINE_LENGTH);
                Outcome::Malformed(RecordError::TooLong(MAX_LINE_LENGTH))
            }
            Some(Err(AnyDelimiterCodecError::Io(e))) => return Err(e.into()),
        };
        lines += 1;
        ctx.route(outcome, dispatch).await?;
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::conf::AuditConfig;
    use crate::dispatch::{DispatchSettings, Dispatcher};
    use crate::sink::FakeSink;
    use crate::state::AuditContext;

    const GOOD: &str = "lb1 haproxy[1]: {\"host\":\"api.example.com\",\"ip\":\"10.0.0.7\",\"method\":\"PUT\",\"path\":\"/v2/panels/568969/zone_informations\",\"query\":\"auth_token=rvLFkLxnmS-65WjxS8ru\",\"status\":200}";
    const READ: &str = "lb1 haproxy[1]: {\"host\":\"api.example.com\",\"ip\":\"10.0.0.7\",\"method\":\"GET\",\"path\":\"/v2/panels\",\"query\":\"\",\"status\":200}";

    fn setup() -> (SharedContext, Arc<FakeSink>, Dispatcher) {
        let ctx = Arc::new(AuditContext::new(AuditConfig::default()).unwrap());
        let sink = Arc::new(FakeSink::new());
        let dispatcher = Dispatcher::start(
            sink.clone(),
            ctx.metrics.clone(),
            DispatchSettings {
                workers: 2,
                queue_depth: 4,
                persist_timeout: Duration::from_secs(1),
                drain_timeout: Duration::from_secs(1),
            },
        );
        (ctx, sink, dispatcher)
    }

    #[tokio::test]
    async fn test_reader_processes_every_line() {
        let (ctx, sink, dispatcher) = setup();
        let handle = dispatcher.handle().unwrap();
        let (_tx, rx) = watch::channel(false);

        let input = format!("{GOOD}\n{READ}\nnot a record\n{GOOD}");
        let lines = run_reader(input.as_bytes(), &ctx, &handle, rx).await.unwrap();
        drop(handle);
        dispatcher.shutdown().await;

        assert_eq!(lines, 4);
        assert_eq!(sink.len().await, 2);
        let snap = ctx.metrics.snapshot();
        assert_eq!(snap.skipped, 1);
        assert_eq!(snap.malformed, 1);
    }

    #[tokio::test]
    async fn test_reader_survives_invalid_utf8() {
        let (ctx, sink, dispatcher) = setup();
        let handle = dispatcher.handle().unwrap();
        let (_tx, rx) = watch::channel(false);

        let mut input = b"\xff\xfe broken\n".to_vec();
        input.extend_from_slice(GOOD.as_bytes());
        input.push(b'\n');
        let lines = run_reader(input.as_slice(), &ctx, &handle, rx).await.unwrap();
        drop(handle);
        dispatcher.shutdown().await;

        assert_eq!(lines, 2);
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_reader_skips_oversized_line() {
        let (ctx, sink, dispatcher) = setup();
        let handle = dispatcher.handle().unwrap();
        let (_tx, rx) = watch::channel(false);

        let input = format!("{GOOD}\n{}\n{GOOD}\n", "x".repeat(MAX_LINE_LENGTH + 10));
        let lines = run_reader(input.as_bytes(), &ctx, &handle, rx).await.unwrap();
        drop(handle);
        dispatcher.shutdown().await;

        assert_eq!(lines, 3);
        assert_eq!(sink.len().await, 2);
        assert_eq!(ctx.metrics.snapshot().malformed, 1);
    }

    #[tokio::test]
    async fn test_reader_stops_on_shutdown() {
        let (ctx, _sink, dispatcher) = setup();
        let handle = dispatcher.handle().unwrap();
        let (tx, rx) = watch::channel(false);

        // A pipe that never reaches EOF.
        let (_writer, reader) = tokio::io::duplex(64);
        let task = {
            let ctx = ctx.clone();
            tokio::spawn(async move { run_reader(reader, &ctx, &handle, rx).await })
        };

        tx.send(true).unwrap();
        let lines = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reader should stop")
            .unwrap()
            .unwrap();
        assert_eq!(lines, 0);
        dispatcher.shutdown().await;
    }
}
