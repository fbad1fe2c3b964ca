//! Conversation Transcript Reducer
//!
//! Owns the ordered transcript of one conversation and folds
//! [`StreamEvent`]s into it. The transcript is append-only except for the
//! single currently-streaming message, which is the only message the
//! reducer ever mutates in place - and the only one it ever removes.
//!
//! # Design Philosophy
//!
//! All transcript mutation flows through [`Conversation::apply`]. There are
//! no update closures capturing stale snapshots: callers hand the reducer an
//! event and observe the resulting state. [`Conversation::fold`] exposes the
//! same transition as a pure fold for callers that prefer value-passing.
//!
//! Events are applied strictly in receipt order. The reducer never reorders
//! or coalesces; in particular `Token` events concatenate rather than
//! replace, so display order is exactly arrival order.

use serde::{Deserialize, Serialize};

use crate::messages::{ConversationId, Message, MessageId, MessageRole};
use crate::stream::StreamEvent;

/// Result of applying one event to the transcript
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The session continues; more events are expected
    Continue,
    /// The session ended successfully; the streaming message is finalized
    Completed,
    /// The session failed; the streaming message was removed and the
    /// carried message should be surfaced to the user
    Failed(String),
}

/// The ordered transcript of one conversation
///
/// Invariant: at most one message has `streaming == true` at any time,
/// tracked by `streaming_id`. Starting a new exchange while one is in
/// flight is a caller error - callers gate submission on
/// [`Conversation::is_streaming`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    id: ConversationId,
    /// Messages in chronological order
    messages: Vec<Message>,
    /// ID of the currently-streaming message, if any
    streaming_id: Option<MessageId>,
}

impl Conversation {
    /// Create a new, empty conversation
    pub fn new() -> Self {
        Self::with_id(ConversationId::new())
    }

    /// Create a conversation with a specific ID
    pub fn with_id(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            streaming_id: None,
        }
    }

    /// Get the conversation ID
    #[must_use]
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// All messages in chronological order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get a message by ID
    pub fn get_message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Whether a streaming message is currently in flight
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming_id.is_some()
    }

    /// ID of the currently-streaming message, if any
    #[must_use]
    pub fn streaming_message_id(&self) -> Option<&MessageId> {
        self.streaming_id.as_ref()
    }

    /// Append a finalized system message
    pub fn add_system_message(&mut self, content: impl Into<String>) -> MessageId {
        let msg = Message::new(MessageRole::System, content.into());
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Begin a new exchange
    ///
    /// Appends the finalized user message, then the empty streaming
    /// assistant placeholder that subsequent events will fill. Returns the
    /// placeholder's ID. Callers must not begin an exchange while another
    /// is streaming.
    pub fn begin_exchange(&mut self, user_content: impl Into<String>) -> MessageId {
        self.messages
            .push(Message::new(MessageRole::User, user_content.into()));

        let placeholder = Message::streaming(MessageRole::Assistant);
        let id = placeholder.id.clone();
        self.streaming_id = Some(id.clone());
        self.messages.push(placeholder);
        id
    }

    /// Apply one stream event to the transcript
    ///
    /// Transitions:
    /// - `Token(t)` appends `t` to the streaming message content
    /// - `Thinking(t)` replaces the streaming message's thinking trace
    /// - `FunctionCall(r)` appends `r` to the streaming message's call list
    /// - `Complete` finalizes the streaming message
    /// - `Error(m)` removes the streaming message entirely
    ///
    /// Events arriving with no streaming message in flight (including any
    /// event after a terminal one) are invalid; they are logged and
    /// ignored rather than corrupting finalized messages.
    pub fn apply(&mut self, event: StreamEvent) -> ApplyOutcome {
        let Some(streaming_id) = self.streaming_id.clone() else {
            tracing::warn!(?event, "stream event with no message in flight; ignoring");
            return ApplyOutcome::Continue;
        };

        match event {
            StreamEvent::Token(text) => {
                if let Some(msg) = self.streaming_message_mut(&streaming_id) {
                    msg.append(&text);
                }
                ApplyOutcome::Continue
            }
            StreamEvent::Thinking(text) => {
                if let Some(msg) = self.streaming_message_mut(&streaming_id) {
                    msg.set_thinking(text);
                }
                ApplyOutcome::Continue
            }
            StreamEvent::FunctionCall(record) => {
                if let Some(msg) = self.streaming_message_mut(&streaming_id) {
                    msg.push_function_call(record);
                }
                ApplyOutcome::Continue
            }
            StreamEvent::Complete => {
                if let Some(msg) = self.streaming_message_mut(&streaming_id) {
                    msg.complete();
                }
                self.streaming_id = None;
                ApplyOutcome::Completed
            }
            StreamEvent::Error(message) => {
                self.messages.retain(|m| m.id != streaming_id);
                self.streaming_id = None;
                ApplyOutcome::Failed(message)
            }
        }
    }

    /// Pure fold form of [`Conversation::apply`]
    #[must_use]
    pub fn fold(mut state: Conversation, event: StreamEvent) -> (Conversation, ApplyOutcome) {
        let outcome = state.apply(event);
        (state, outcome)
    }

    /// Discard the in-flight streaming message, if any
    ///
    /// Used on cancellation and on request failures after the placeholder
    /// was created, so the transcript never retains a permanently-streaming
    /// message.
    pub fn discard_streaming(&mut self) {
        if let Some(streaming_id) = self.streaming_id.take() {
            self.messages.retain(|m| m.id != streaming_id);
        }
    }

    fn streaming_message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
