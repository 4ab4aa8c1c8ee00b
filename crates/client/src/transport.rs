// crates/client/src/transport.rs
//! The resilient duplex channel to one live session.
//!
//! One owner task per channel runs an explicit connection state machine
//! (Connecting, Open, Backoff) and is the only writer of connection state.
//! The handle talks to it over a command channel, so `close()` is race-free:
//! the task checks for commands before acting on any timer or connect result,
//! and once it exits, a connect attempt still in flight is dropped on the
//! floor and can never resurrect the session.
//!
//! Outbound envelopes are never queued across a gap: anything handed to
//! [`SessionChannel::send`] while the socket is down is silently dropped.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use haggle_types::{ClientEnvelope, ServerMessage};

use crate::config::ClientConfig;
use crate::error::TransportError;

/// Anything that accepts fire-and-forget outbound envelopes. The interaction
/// tracker writes through this seam so tests can collect envelopes without a
/// socket.
pub trait EnvelopeSink: Send + Sync + 'static {
    fn send(&self, envelope: ClientEnvelope);
}

enum Command {
    Send(ClientEnvelope),
    Close,
}

/// Handle to the live channel for one session id.
///
/// Dropping the handle tears the connection down the same way `close()` does.
pub struct SessionChannel {
    session_id: String,
    cmd_tx: mpsc::UnboundedSender<Command>,
    connected_rx: watch::Receiver<bool>,
    retry_count: Arc<AtomicU32>,
}

impl SessionChannel {
    /// Bind a channel to `session_id` and start connecting.
    ///
    /// Returns the handle plus the inbound stream: decoded server messages in
    /// exact arrival order. Frames that fail to decode are dropped before
    /// they reach the stream.
    pub fn open(
        config: &ClientConfig,
        session_id: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerMessage>), TransportError> {
        let url = config.ws_url(session_id)?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = watch::channel(false);
        let retry_count = Arc::new(AtomicU32::new(0));

        tokio::spawn(run_channel(
            url,
            session_id.to_string(),
            cmd_rx,
            inbound_tx,
            connected_tx,
            Arc::clone(&retry_count),
            config.backoff_base,
            config.backoff_cap,
        ));

        Ok((
            Self {
                session_id: session_id.to_string(),
                cmd_tx,
                connected_rx,
                retry_count,
            },
            inbound_rx,
        ))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Hand an envelope to the owner task. Dropped silently when the socket
    /// is down or the channel is closed. No queue, no buffering.
    pub fn send(&self, envelope: ClientEnvelope) {
        let _ = self.cmd_tx.send(Command::Send(envelope));
    }

    /// Tear down deterministically: cancels any pending reconnect timer and
    /// suppresses further retries.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }

    /// Connection indicator: true on a successful open, false on any close,
    /// explicit or lost.
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected_rx.clone()
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Relaxed)
    }
}

impl EnvelopeSink for SessionChannel {
    fn send(&self, envelope: ClientEnvelope) {
        SessionChannel::send(self, envelope);
    }
}

/// Reconnect delay for the given consecutive-failure count:
/// base, 2·base, 4·base, … capped.
fn backoff_delay(retry: u32, base: Duration, cap: Duration) -> Duration {
    // 2^retry saturates long before the cap matters.
    let factor = 2u32.saturating_pow(retry.min(30));
    base.saturating_mul(factor).min(cap)
}

#[allow(clippy::too_many_arguments)]
async fn run_channel(
    url: String,
    session_id: String,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    inbound_tx: mpsc::UnboundedSender<ServerMessage>,
    connected_tx: watch::Sender<bool>,
    retry_count: Arc<AtomicU32>,
    backoff_base: Duration,
    backoff_cap: Duration,
) {
    let mut pending_delay: Option<Duration> = None;

    'lifecycle: loop {
        // ── Backoff ─────────────────────────────────────────────────────
        if let Some(delay) = pending_delay.take() {
            debug!(%session_id, ?delay, "waiting before reconnect");
            let timer = tokio::time::sleep(delay);
            tokio::pin!(timer);
            loop {
                tokio::select! {
                    // Commands are checked before the timer; close() must
                    // cancel a pending reconnect even when both are ready.
                    biased;
                    cmd = cmd_rx.recv() => match cmd {
                        Some(Command::Send(_)) => continue, // down: drop it
                        Some(Command::Close) | None => break 'lifecycle,
                    },
                    _ = &mut timer => break,
                }
            }
        }

        // ── Connecting ──────────────────────────────────────────────────
        let attempt = connect_async(url.as_str());
        tokio::pin!(attempt);
        let ws = loop {
            tokio::select! {
                biased;
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(_)) => continue, // not open yet: drop
                    // The in-flight attempt is dropped with the future.
                    Some(Command::Close) | None => break 'lifecycle,
                },
                result = &mut attempt => match result {
                    Ok((ws, _)) => break ws,
                    Err(e) => {
                        let retries = retry_count.fetch_add(1, Ordering::Relaxed);
                        pending_delay =
                            Some(backoff_delay(retries, backoff_base, backoff_cap));
                        debug!(%session_id, error = %e, retries, "connect failed");
                        continue 'lifecycle;
                    }
                },
            }
        };

        retry_count.store(0, Ordering::Relaxed);
        connected_tx.send_replace(true);
        info!(%session_id, "session channel open");
        let (mut sink, mut stream) = ws.split();

        // ── Open ────────────────────────────────────────────────────────
        let lost = loop {
            tokio::select! {
                biased;
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        match serde_json::to_string(&envelope) {
                            Ok(text) => {
                                if sink.send(Message::Text(text.into())).await.is_err() {
                                    break true;
                                }
                            }
                            Err(e) => warn!(%session_id, error = %e, "unencodable envelope dropped"),
                        }
                    }
                    Some(Command::Close) | None => break false,
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                let _ = inbound_tx.send(msg);
                            }
                            Err(e) => {
                                debug!(%session_id, error = %e, "malformed inbound frame dropped");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break true,
                    Some(Err(e)) => {
                        debug!(%session_id, error = %e, "socket error");
                        break true;
                    }
                    Some(Ok(_)) => {} // ping/pong/binary
                },
            }
        };

        connected_tx.send_replace(false);
        if !lost {
            break 'lifecycle;
        }

        let retries = retry_count.fetch_add(1, Ordering::Relaxed);
        pending_delay = Some(backoff_delay(retries, backoff_base, backoff_cap));
        info!(%session_id, retries, "connection lost, scheduling reconnect");
    }

    connected_tx.send_replace(false);
    debug!(%session_id, "session channel task ended");
}
