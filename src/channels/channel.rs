//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::flow::{RenderInstruction, UserInput};

/// Stream of inbound user events from one or more channels.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A user event received on a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced the event.
    pub channel: String,
    /// Stable user identifier within the channel.
    pub user_id: String,
    /// Display name, if the channel knows one.
    pub user_name: Option<String>,
    pub input: UserInput,
    /// Channel-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, input: UserInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            input,
            metadata: serde_json::Value::Null,
            received_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    /// Key of the conversation this event belongs to.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.user_id)
    }
}

/// What to send back for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub render: RenderInstruction,
}

impl OutgoingResponse {
    pub fn new(render: RenderInstruction) -> Self {
        Self { render }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(RenderInstruction::text(content))
    }
}

impl From<RenderInstruction> for OutgoingResponse {
    fn from(render: RenderInstruction) -> Self {
        Self::new(render)
    }
}

/// Transient progress shown while a slow step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A backend call is in flight; Telegram shows "typing".
    Thinking(String),
}

/// A transport that delivers user events and renders replies.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving events.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver the reply to `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}
