//! Document-Store API Client
//!
//! HTTP client for the two endpoints the streaming pipeline touches: the
//! assistant streaming endpoint (POST, line-framed event body) and the
//! mention search endpoint (GET, JSON array of references). Everything
//! else the store serves - record CRUD, uploads, settings - belongs to
//! other collaborators.
//!
//! # Failure Handling
//!
//! Request rejection and non-success statuses surface as [`ChatError`]
//! before a session exists. Once the body stream is handed to
//! [`StreamSession`], mid-stream failures travel the event path instead
//! (see [`crate::stream::session`]).

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::AssistantConfig;
use crate::conversation::Conversation;
use crate::mention::MentionReference;
use crate::messages::{ConversationId, MessageRole};
use crate::stream::{SessionConfig, StreamSession};

/// Errors opening a session or querying the store
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request could not be sent or the response not read
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: reqwest::StatusCode,
        /// Response body, for diagnostics
        body: String,
    },
}

/// One `{role, content}` entry of the outbound request body
#[derive(Clone, Debug, Serialize)]
pub struct OutboundMessage {
    /// Who authored the message
    pub role: MessageRole,
    /// Message content, mentions already encoded inline
    pub content: String,
}

/// Body of the streaming request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation history, oldest first
    pub messages: Vec<OutboundMessage>,
    /// Documents pinned as context for this exchange
    pub context_document_ids: Vec<String>,
    /// The conversation being extended
    pub conversation_id: ConversationId,
}

impl ChatRequest {
    /// Build a request from the finalized messages of a conversation
    ///
    /// The in-flight streaming placeholder (empty, not yet part of the
    /// history) is excluded.
    #[must_use]
    pub fn from_conversation(
        conversation: &Conversation,
        context_document_ids: Vec<String>,
    ) -> Self {
        let messages = conversation
            .messages()
            .iter()
            .filter(|m| !m.streaming)
            .map(|m| OutboundMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        Self {
            messages,
            context_document_ids,
            conversation_id: conversation.id().clone(),
        }
    }
}

/// Keyed search collaborator for mention candidates
///
/// The controller in [`crate::mention::autocomplete`] hands the live query
/// to an implementation of this trait; result order is the
/// implementation's relevance ranking. Debouncing and caching are the
/// implementation's concern.
#[async_trait]
pub trait MentionSearch: Send + Sync {
    /// Search records matching `query`
    async fn search(&self, query: &str) -> anyhow::Result<Vec<MentionReference>>;
}

/// Client for the document-store API
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    session_config: SessionConfig,
    http: reqwest::Client,
}

impl ChatClient {
    /// Create a client from configuration
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_config: config.session_config(),
            http: reqwest::Client::builder()
                .connect_timeout(config.connect_timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Get the streaming endpoint URL
    fn stream_url(&self) -> String {
        format!("{}/api/assistant/stream", self.base_url)
    }

    /// Get the mention search endpoint URL
    fn mention_search_url(&self) -> String {
        format!("{}/api/mentions/search", self.base_url)
    }

    /// Open a streaming session for a prepared request
    ///
    /// Checks the response status, then hands the body stream to a
    /// [`StreamSession`] which owns it until completion or cancellation.
    pub async fn open_session(&self, request: &ChatRequest) -> Result<StreamSession, ChatError> {
        let response = self
            .http
            .post(self.stream_url())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        Ok(StreamSession::from_byte_stream(
            response.bytes_stream(),
            &self.session_config,
        ))
    }

    /// Submit user input on a conversation
    ///
    /// Whitespace-only input is a no-op (`Ok(None)`); nothing is appended
    /// and no request is made. Otherwise the exchange is begun on the
    /// conversation and a session opened; if the request fails, the
    /// streaming placeholder is discarded before the error is returned so
    /// the transcript stays consistent.
    ///
    /// Callers gate on [`Conversation::is_streaming`] - one active session
    /// per conversation.
    pub async fn submit(
        &self,
        conversation: &mut Conversation,
        input: &str,
        context_document_ids: Vec<String>,
    ) -> Result<Option<StreamSession>, ChatError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        conversation.begin_exchange(input);
        let request = ChatRequest::from_conversation(conversation, context_document_ids);

        match self.open_session(&request).await {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                conversation.discard_streaming();
                Err(error)
            }
        }
    }

    /// Search mention candidates
    ///
    /// Results arrive relevance-ranked from the store and are returned in
    /// that order.
    pub async fn search_mentions(&self, query: &str) -> Result<Vec<MentionReference>, ChatError> {
        let response = self
            .http
            .get(self.mention_search_url())
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MentionSearch for ChatClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<MentionReference>> {
        Ok(self.search_mentions(query).await?)
    }
}
