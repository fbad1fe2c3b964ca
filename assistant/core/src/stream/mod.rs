//! Streaming Response Pipeline
//!
//! The three stages between the HTTP response body and the transcript:
//!
//! ```text
//! bytes ──> FrameDecoder ──> frames ──> parse_frame ──> StreamEvent
//!                                                           │
//!                              Conversation::apply  <───────┘
//! ```
//!
//! [`frame`] buffers arbitrarily-chunked bytes into complete protocol
//! lines, [`event`] decodes one line into a typed [`StreamEvent`], and
//! [`session`] owns the in-flight request that drives both and feeds the
//! reducer in [`crate::conversation`].

pub mod event;
pub mod frame;
pub mod session;

pub use event::{parse_frame, StreamEvent, DATA_PREFIX};
pub use frame::FrameDecoder;
pub use session::{SessionConfig, SessionError, StreamSession, StreamStats};
