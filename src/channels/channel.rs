//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;
use crate::interview::Prompt;

/// A message received from an external channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel this arrived on ("cli", "http", ...).
    pub channel: String,
    pub user_id: String,
    pub content: String,
    /// Conversation thread within the channel, when it has one.
    pub thread_id: Option<String>,
    pub received_at: DateTime<Utc>,
    /// Channel-specific routing data.
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            user_id: user_id.into(),
            content: content.into(),
            thread_id: None,
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Key of the interview session this message belongs to.
    ///
    /// Scoped by channel, then by thread if present, else by user.
    pub fn session_key(&self) -> String {
        let conversation = self.thread_id.as_deref().unwrap_or(&self.user_id);
        format!("{}:{}", self.channel, conversation)
    }
}

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A reply to send back through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    /// Plain-text rendering.
    pub content: String,
    /// The structured prompt, for channels that can render options natively.
    pub prompt: Option<Prompt>,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt: None,
        }
    }

    pub fn prompt(prompt: Prompt) -> Self {
        Self {
            content: prompt.to_text(),
            prompt: Some(prompt),
        }
    }
}

/// A bidirectional message transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
