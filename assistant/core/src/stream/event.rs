//! Stream Event Parsing
//!
//! Decodes one wire frame into a typed [`StreamEvent`]. Event frames carry
//! the `data: ` sentinel followed by a JSON object discriminated by its
//! `type` field; anything else on the wire (keep-alive lines, comments) is
//! not an event frame and is ignored.
//!
//! A frame that carries the sentinel but fails to decode is dropped with a
//! debug log and the session continues - streaming backends occasionally
//! emit partial or oddly-encoded frames at chunk boundaries, and one bad
//! frame must not abort the exchange.

use serde::Deserialize;

use crate::messages::FunctionCallRecord;

/// Sentinel prefix marking an event frame
pub const DATA_PREFIX: &str = "data: ";

/// One decoded event from the streaming response
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// A fragment of assistant response text
    Token(String),
    /// The assistant's thinking trace (each replaces the previous)
    Thinking(String),
    /// A function call surfaced mid-response
    FunctionCall(FunctionCallRecord),
    /// The response finished successfully; terminal
    Complete,
    /// The response failed with the carried message; terminal
    Error(String),
}

impl StreamEvent {
    /// Whether this event terminates the session
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error(_))
    }
}

/// Wire shape of an event frame payload
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Token {
        /// Text fragment
        content: String,
    },
    Thinking {
        /// Thinking trace
        content: String,
    },
    FunctionCall {
        /// Structured call record
        content: FunctionCallRecord,
    },
    Complete,
    Error {
        /// Error message
        content: String,
    },
}

impl From<WireEvent> for StreamEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::Token { content } => Self::Token(content),
            WireEvent::Thinking { content } => Self::Thinking(content),
            WireEvent::FunctionCall { content } => Self::FunctionCall(content),
            WireEvent::Complete => Self::Complete,
            WireEvent::Error { content } => Self::Error(content),
        }
    }
}

/// Parse one frame into an event
///
/// Returns `None` for non-event frames (no sentinel) and for sentinel
/// frames whose payload does not decode - the latter are logged and
/// skipped, never raised.
pub fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let payload = frame.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<WireEvent>(payload) {
        Ok(wire) => Some(wire.into()),
        Err(error) => {
            tracing::debug!(%error, payload, "dropping malformed event frame");
            None
        }
    }
}
