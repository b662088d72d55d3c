//! Chat message views.

use chrono::{DateTime, Utc};

use crate::{ClusterState, MarkerSet};

/// A message as read back from a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMessage {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// True if this message was posted by our own posting identity.
    pub from_self: bool,
}

impl ChannelMessage {
    /// Interpret this message as a status notification.
    ///
    /// Returns `None` for messages posted by someone else and for bodies
    /// without a marker.
    pub fn as_notification(&self, markers: &MarkerSet) -> Option<Notification> {
        if !self.from_self {
            return None;
        }
        let state = markers.classify(&self.content)?;
        Some(Notification {
            message_id: self.id.clone(),
            channel_id: self.channel_id.clone(),
            body: self.content.clone(),
            created_at: self.created_at,
            state,
        })
    }
}

/// A previously posted status message and the state it announced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notification {
    pub message_id: String,
    pub channel_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub state: ClusterState,
}

/// A message to post or an edit to apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutgoingMessage {
    pub content: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub username: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub avatar_url: Option<String>,
}

impl OutgoingMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the display name shown for this message.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the avatar shown for this message.
    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}
