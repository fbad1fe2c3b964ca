//! Transcript Data Model
//!
//! Core types for the conversation transcript: message and conversation
//! identifiers, roles, the [`Message`] record itself, and the structured
//! record of a function call surfaced mid-stream.
//!
//! # Design Philosophy
//!
//! Messages are plain data. All mutation happens through the reducer in
//! [`crate::conversation`]; nothing here schedules work or talks to the
//! network. Function-call arguments and results are carried as opaque
//! [`serde_json::Value`]s - the assistant backend owns their schemas, the
//! client does not guess at them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Conversation identifier
///
/// Conversations are created client-side and referenced by the store, so
/// the ID must be globally unique rather than process-unique.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a new unique conversation ID
    pub fn new() -> Self {
        Self(format!("conv_{}", uuid::Uuid::new_v4()))
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// The assistant
    Assistant,
    /// System message
    System,
}

/// A function call surfaced by the assistant while streaming
///
/// The wire shape is `{"name": ..., "arguments": {...}, "result": ...}`.
/// Arguments and result are opaque structured values; `result` is present
/// once the call has resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    /// Function name
    pub name: String,
    /// Argument bag, schema owned by the backend
    pub arguments: Value,
    /// Result value, present once the call resolves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// A message in the conversation transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content (mutable while streaming, fixed once finalized)
    pub content: String,
    /// When the message was created (Unix timestamp ms)
    pub timestamp: u64,
    /// Thinking trace, if the assistant surfaced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Function calls surfaced while producing this message, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_calls: Vec<FunctionCallRecord>,
    /// Whether the message is still being streamed
    pub streaming: bool,
}

impl Message {
    /// Create a new finalized message
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            timestamp: now_ms(),
            thinking: None,
            function_calls: Vec::new(),
            streaming: false,
        }
    }

    /// Create a new streaming message (content will be appended to)
    pub fn streaming(role: MessageRole) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: String::new(),
            timestamp: now_ms(),
            thinking: None,
            function_calls: Vec::new(),
            streaming: true,
        }
    }

    /// Append content to a streaming message
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Replace the thinking trace
    pub fn set_thinking(&mut self, text: String) {
        self.thinking = Some(text);
    }

    /// Record a function call, preserving arrival order
    pub fn push_function_call(&mut self, record: FunctionCallRecord) {
        self.function_calls.push(record);
    }

    /// Mark streaming as complete
    pub fn complete(&mut self) {
        self.streaming = false;
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_conversation_id_unique() {
        let id1 = ConversationId::new();
        let id2 = ConversationId::new();
        assert_ne!(id1, id2);
        assert!(id1.0.starts_with("conv_"));
    }

    #[test]
    fn test_streaming_message_append() {
        let mut msg = Message::streaming(MessageRole::Assistant);
        assert!(msg.streaming);
        assert!(msg.content.is_empty());

        msg.append("Hello ");
        msg.append("world!");
        assert_eq!(msg.content, "Hello world!");

        msg.complete();
        assert!(!msg.streaming);
    }

    #[test]
    fn test_thinking_replaces() {
        let mut msg = Message::streaming(MessageRole::Assistant);
        msg.set_thinking("first draft".to_string());
        msg.set_thinking("final trace".to_string());
        assert_eq!(msg.thinking.as_deref(), Some("final trace"));
    }

    #[test]
    fn test_function_calls_keep_order() {
        let mut msg = Message::streaming(MessageRole::Assistant);
        msg.push_function_call(FunctionCallRecord {
            name: "search_documents".to_string(),
            arguments: serde_json::json!({"query": "quarterly report"}),
            result: None,
        });
        msg.push_function_call(FunctionCallRecord {
            name: "fetch_document".to_string(),
            arguments: serde_json::json!({"id": "doc_7"}),
            result: Some(serde_json::json!({"title": "Q3"})),
        });

        let names: Vec<_> = msg.function_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["search_documents", "fetch_document"]);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&MessageRole::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_function_call_record_wire_shape() {
        let json = r#"{"name":"lookup","arguments":{"id":3}}"#;
        let record: FunctionCallRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "lookup");
        assert_eq!(record.arguments["id"], 3);
        assert!(record.result.is_none());
    }
}
