//! Stream Session
//!
//! Owns one in-flight streamed exchange. A spawned pump task reads the
//! response body, runs it through the frame decoder and event parser, and
//! forwards typed events over a bounded channel; the session handle on the
//! caller's side exposes awaiting, non-blocking polling, and a convenience
//! fold that drives a [`Conversation`] to the terminal event.
//!
//! # Resource Ownership
//!
//! The pump task owns the response body stream. Dropping the session
//! aborts the pump, which drops the body and releases the underlying
//! connection - the same cleanup runs on normal completion, error,
//! explicit cancel, and caller teardown.
//!
//! # Ordering
//!
//! Frames are processed strictly in arrival order and events are forwarded
//! in the same order; the channel never reorders.

use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::conversation::{ApplyOutcome, Conversation};
use crate::stream::event::{parse_frame, StreamEvent};
use crate::stream::frame::FrameDecoder;

/// Errors that end a session without a successful completion
#[derive(Debug, Error)]
pub enum SessionError {
    /// The stream carried an explicit error event, or the transport failed
    /// mid-stream; the message is user-facing
    #[error("stream error: {0}")]
    Stream(String),

    /// The stream closed before a terminal event arrived
    #[error("stream disconnected before completion")]
    Disconnected,
}

/// Configuration for one stream session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Event channel capacity between the pump task and the consumer
    pub event_buffer: usize,
    /// Maximum time to wait between body chunks; elapsing surfaces as an
    /// error event. `None` disables the idle timeout.
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_buffer: 100,
            idle_timeout: None,
        }
    }
}

impl SessionConfig {
    /// Set the idle timeout
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }
}

/// Counters for one session, maintained on the consumer side
#[derive(Clone, Debug)]
pub struct StreamStats {
    /// Total events received
    pub events_received: u64,
    /// Token events received
    pub tokens_received: u64,
    /// When the session was opened
    pub started_at: Instant,
    /// When the most recent event was received
    pub last_event_at: Option<Instant>,
}

impl StreamStats {
    fn new() -> Self {
        Self {
            events_received: 0,
            tokens_received: 0,
            started_at: Instant::now(),
            last_event_at: None,
        }
    }

    fn record(&mut self, event: &StreamEvent) {
        self.events_received += 1;
        if matches!(event, StreamEvent::Token(_)) {
            self.tokens_received += 1;
        }
        self.last_event_at = Some(Instant::now());
    }
}

/// One in-flight streamed exchange
///
/// Normally constructed by [`crate::client::ChatClient::open_session`];
/// [`StreamSession::from_byte_stream`] accepts any chunked byte source,
/// which is also how tests feed the pipeline.
pub struct StreamSession {
    events: mpsc::Receiver<StreamEvent>,
    pump: JoinHandle<()>,
    stats: StreamStats,
    finished: bool,
}

impl StreamSession {
    /// Start a session over a chunked byte source
    ///
    /// The source is consumed on a spawned task until a terminal event is
    /// forwarded, the source ends, or the session is dropped.
    pub fn from_byte_stream<S, C, E>(chunks: S, config: &SessionConfig) -> Self
    where
        S: Stream<Item = Result<C, E>> + Send + 'static,
        C: AsRef<[u8]> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.event_buffer);
        let idle_timeout = config.idle_timeout;
        let pump = tokio::spawn(pump_events(chunks, idle_timeout, tx));

        Self {
            events: rx,
            pump,
            stats: StreamStats::new(),
            finished: false,
        }
    }

    /// Await the next event
    ///
    /// Returns `None` once the pump has stopped and all forwarded events
    /// were consumed. A `None` before any terminal event means the
    /// transport closed early.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        let event = self.events.recv().await;
        match event {
            Some(ref event) => {
                self.stats.record(event);
                if event.is_terminal() {
                    self.finished = true;
                }
            }
            None => self.finished = true,
        }
        event
    }

    /// Drain all immediately-available events (non-blocking)
    ///
    /// For callers on a cooperative UI loop that poll between turns. If
    /// the pump stopped without a terminal event, a synthesized error
    /// event reports the disconnect, so polling callers always observe a
    /// terminal event.
    pub fn poll(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.stats.record(&event);
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        self.finished = true;
                        break;
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.finished = true;
                    events.push(StreamEvent::Error(
                        "stream disconnected before completion".to_string(),
                    ));
                    break;
                }
            }
        }
        events
    }

    /// Drive the session to its terminal event, folding into `conversation`
    ///
    /// On `Complete` the streaming message is finalized and `Ok(())` is
    /// returned. On an error event the reducer removes the streaming
    /// message and the carried message is returned. If the transport
    /// closes without a terminal event, the streaming message is discarded
    /// and [`SessionError::Disconnected`] is returned - the transcript
    /// never retains a dangling streaming message.
    pub async fn drive(mut self, conversation: &mut Conversation) -> Result<(), SessionError> {
        while let Some(event) = self.next_event().await {
            match conversation.apply(event) {
                ApplyOutcome::Continue => {}
                ApplyOutcome::Completed => return Ok(()),
                ApplyOutcome::Failed(message) => return Err(SessionError::Stream(message)),
            }
        }
        conversation.discard_streaming();
        Err(SessionError::Disconnected)
    }

    /// Cancel the session, releasing the connection
    ///
    /// Equivalent to dropping the session. Callers pair this with
    /// [`Conversation::discard_streaming`] so the transcript does not keep
    /// the half-filled streaming message.
    pub fn cancel(self) {
        drop(self);
    }

    /// Session counters
    #[must_use]
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Whether a terminal event (or disconnect) has been observed
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Pump the byte source through the decoder and parser into the channel
///
/// Stops after forwarding a terminal event, when the source ends, when the
/// receiver is dropped, or when the idle timeout elapses (surfaced as an
/// error event, per the transport failure path).
async fn pump_events<S, C, E>(
    chunks: S,
    idle_timeout: Option<Duration>,
    tx: mpsc::Sender<StreamEvent>,
) where
    S: Stream<Item = Result<C, E>> + Send + 'static,
    C: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut chunks = Box::pin(chunks);
    let mut decoder = FrameDecoder::new();

    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
                Ok(item) => item,
                Err(_) => {
                    tracing::debug!(timeout_ms = limit.as_millis() as u64, "stream idle timeout");
                    let _ = tx
                        .send(StreamEvent::Error(format!(
                            "no data received for {}ms",
                            limit.as_millis()
                        )))
                        .await;
                    return;
                }
            },
            None => chunks.next().await,
        };

        match next {
            Some(Ok(chunk)) => {
                for frame in decoder.push(chunk.as_ref()) {
                    let Some(event) = parse_frame(&frame) else {
                        continue;
                    };
                    let terminal = event.is_terminal();
                    if tx.send(event).await.is_err() {
                        // receiver dropped; stop reading
                        return;
                    }
                    if terminal {
                        return;
                    }
                }
            }
            Some(Err(error)) => {
                let _ = tx.send(StreamEvent::Error(error.to_string())).await;
                return;
            }
            None => {
                decoder.finish();
                return;
            }
        }
    }
}
