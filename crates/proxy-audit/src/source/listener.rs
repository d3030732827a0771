//! Listener — request-offload messages over TCP.
//!
//! Each connection carries newline-delimited JSON frames:
//!
//! ```text
//! {"name":"audit-response","args":[{"name":"ip","value":"10.0.0.7"}, ...]}
//! ```
//!
//! Frames whose name does not match the configured message name are ignored.

use std::io;

use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use super::{stopped, SourceError};
use crate::dispatch::DispatchHandle;
use crate::record::AgentMessage;
use crate::state::SharedContext;

pub const MAX_FRAME_LENGTH: usize = 64 * 1024;

/// Per-connection frame counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub frames: u64,
    pub processed: u64,
    pub ignored: u64,
    pub invalid: u64,
}

pub async fn bind(addr: &str) -> Result<TcpListener, SourceError> {
    TcpListener::bind(addr).await.map_err(|source| SourceError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Accept connections until shutdown, then stop every connection reader.
pub async fn run_listener(
    listener: TcpListener,
    ctx: SharedContext,
    dispatch: DispatchHandle,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SourceError> {
    match listener.local_addr() {
        Ok(addr) => info!("Listening for offload messages on {}", addr),
        Err(_) => info!("Listening for offload messages"),
    }

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    connections.spawn(serve_connection(
                        stream,
                        peer.to_string(),
                        ctx.clone(),
                        dispatch.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => error!("TCP accept error: {}", e),
            },
            Some(done) = connections.join_next(), if !connections.is_empty() => {
                if let Ok(Err(e)) = done {
                    warn!("Connection ended with error: {}", e);
                }
            }
            _ = stopped(&mut shutdown) => break,
        }
    }

    info!("Listener stopping; {} open connections", connections.len());
    while let Some(done) = connections.join_next().await {
        if let Ok(Err(e)) = done {
            warn!("Connection ended with error: {}", e);
        }
    }
    Ok(())
}

/// Read frames from one connection until EOF or shutdown.
pub async fn serve_connection<S>(
    stream: S,
    peer: String,
    ctx: SharedContext,
    dispatch: DispatchHandle,
    mut shutdown: watch::Receiver<bool>,
) -> Result<ConnectionSummary, SourceError>
where
    S: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH));
    let mut summary = ConnectionSummary::default();
    // FramedRead yields one `None` after a decode error before resuming.
    let mut resume = false;

    loop {
        let frame = tokio::select! {
            frame = frames.next() => frame,
            _ = stopped(&mut shutdown) => break,
        };

        let line = match frame {
            None if resume => {
                resume = false;
                continue;
            }
            None => break,
            Some(Ok(line)) => {
                resume = false;
                line
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                resume = true;
                summary.invalid += 1;
                warn!("Frame from {} exceeds {} bytes; discarded", peer, MAX_FRAME_LENGTH);
                continue;
            }
            // The codec has already consumed the offending line.
            Some(Err(LinesCodecError::Io(e))) if e.kind() == io::ErrorKind::InvalidData => {
                resume = true;
                summary.invalid += 1;
                warn!("Frame from {} is not valid UTF-8; discarded", peer);
                continue;
            }
            Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
        };

        if line.trim().is_empty() {
            continue;
        }
        summary.frames += 1;

        let msg: AgentMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                summary.invalid += 1;
                warn!("Undecodable frame from {}: {}", peer, e);
                continue;
            }
        };

        if msg.name != ctx.config.message_name {
            summary.ignored += 1;
            debug!("Ignoring message {:?} from {}", msg.name, peer);
            continue;
        }

        summary.processed += 1;
        let outcome = ctx.engine.process_message(&msg);
        ctx.route(outcome, &dispatch).await?;
    }

    debug!(
        "Connection {} closed: {} frames, {} processed, {} ignored, {} invalid",
        peer, summary.frames, summary.processed, summary.ignored, summary.invalid
    );
    Ok(summary)
}
