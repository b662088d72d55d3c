//! Chat channel abstraction.
//!
//! The notifier and the recovery step only need five operations from a chat
//! service. [`ChatChannel`] names them; the Discord adapter implements it and
//! tests use an in-memory channel.

mod discord;

use async_trait::async_trait;
use thiserror::Error;

use clusterwatch_types::{ChannelMessage, OutgoingMessage};

/// A chat API failure, classified for retry decisions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Network failure, timeout, rate limit or server error.
    #[error("transient chat API failure: {0}")]
    Transient(String),

    /// The message or channel does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything that will not succeed on repetition.
    #[error("chat API rejected the request: {0}")]
    Rejected(String),
}

impl ChannelError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ChannelError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ChannelError::NotFound(_))
    }
}

/// The operations the monitor needs from a chat service.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Most recent message in the channel, from anyone.
    async fn latest_message(&self, channel_id: &str)
        -> Result<Option<ChannelMessage>, ChannelError>;

    /// Post a new message under our own identity.
    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<ChannelMessage, ChannelError>;

    /// Replace the body of a message we posted.
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, ChannelError>;

    /// Rename the channel. Returns false if it already had that name.
    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<bool, ChannelError>;

    /// Set the channel topic. Returns false if it was already set.
    async fn set_topic(&self, channel_id: &str, topic: &str) -> Result<bool, ChannelError>;
}
