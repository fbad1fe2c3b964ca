//! Assistant Core - Streaming Chat Engine for Dossier
//!
//! This crate is the headless streaming-response pipeline of the Dossier
//! assistant, completely independent of any UI framework. It consumes the
//! chunked body of a streaming HTTP response, decodes it into typed
//! events, folds those events into a conversation transcript, and runs
//! the inline-mention codec and autocomplete machine the composer uses.
//! It can drive a web surface, a TUI, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      UI Surface (external)                    │
//! │   composer + transcript view + mention popup + doc screens    │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │ submit / keys                │ renders
//! ┌───────────────┴──────────────────────────────┴───────────────┐
//! │                       ASSISTANT CORE                          │
//! │  ┌────────────┐   ┌──────────────────────────────────────┐   │
//! │  │ ChatClient │──>│            StreamSession              │   │
//! │  └────────────┘   │  bytes → FrameDecoder → parse_frame   │   │
//! │  ┌────────────┐   └──────────────────┬───────────────────┘   │
//! │  │  Mention   │                      │ StreamEvent           │
//! │  │ codec + AC │   ┌──────────────────┴───────────────────┐   │
//! │  └────────────┘   │      Conversation (reducer/fold)      │   │
//! │                   └──────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conversation`]: the transcript and its event reducer
//! - [`StreamSession`]: one in-flight streamed exchange (owns the body)
//! - [`StreamEvent`]: typed events decoded off the wire
//! - [`FrameDecoder`]: chunk-boundary-safe line framing
//! - [`ChatClient`]: the two store endpoints this pipeline touches
//! - [`MentionAutocomplete`]: the composer's mention state machine
//!
//! # Quick Start
//!
//! ```ignore
//! use assistant_core::{load_config, ChatClient, Conversation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let client = ChatClient::new(&config);
//!     let mut conversation = Conversation::new();
//!
//!     if let Some(session) = client
//!         .submit(&mut conversation, "summarize @[document:Q3 Report]", vec![])
//!         .await?
//!     {
//!         session.drive(&mut conversation).await?;
//!     }
//!
//!     for message in conversation.messages() {
//!         println!("{:?}: {}", message.role, message.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`messages`]: transcript data model (ids, roles, messages, calls)
//! - [`conversation`]: the transcript reducer
//! - [`stream`]: frame decoding, event parsing, session orchestration
//! - [`mention`]: inline mention codec and autocomplete machine
//! - [`client`]: HTTP client for the streaming and search endpoints
//! - [`config`]: TOML + environment configuration
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any rendering framework. It's
//! pure pipeline logic that any surface can drive.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod conversation;
pub mod mention;
pub mod messages;
pub mod stream;

// Re-exports for convenience
pub use client::{ChatClient, ChatError, ChatRequest, MentionSearch, OutboundMessage};
pub use config::{
    default_config_path, load_config, load_config_from_path, AssistantConfig, ConfigError,
};
pub use conversation::{ApplyOutcome, Conversation};
pub use mention::autocomplete::{
    detect_trigger, AutocompleteKey, KeyOutcome, MentionAutocomplete, MentionCommit, MentionQuery,
};
pub use mention::{detect_token, encode, MentionKind, MentionReference, MentionToken};
pub use messages::{ConversationId, FunctionCallRecord, Message, MessageId, MessageRole};
pub use stream::{
    parse_frame, FrameDecoder, SessionConfig, SessionError, StreamEvent, StreamSession,
    StreamStats,
};
