//! [`ChatChannel`] over the Discord REST API.

use async_trait::async_trait;

use clusterwatch_adapters::discord::DiscordAdapter;
use clusterwatch_adapters::AdapterError;
use clusterwatch_types::{ChannelMessage, OutgoingMessage};

use super::{ChannelError, ChatChannel};

impl From<AdapterError> for ChannelError {
    fn from(err: AdapterError) -> Self {
        if err.is_not_found() {
            ChannelError::NotFound(err.to_string())
        } else if err.is_transient() {
            ChannelError::Transient(err.to_string())
        } else {
            ChannelError::Rejected(err.to_string())
        }
    }
}

#[async_trait]
impl ChatChannel for DiscordAdapter {
    async fn latest_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelMessage>, ChannelError> {
        Ok(DiscordAdapter::latest_message(self, channel_id).await?)
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<ChannelMessage, ChannelError> {
        Ok(DiscordAdapter::post_message(self, channel_id, message).await?)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, ChannelError> {
        Ok(DiscordAdapter::edit_message(self, channel_id, message_id, content).await?)
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<bool, ChannelError> {
        Ok(DiscordAdapter::rename_channel(self, channel_id, name).await?)
    }

    async fn set_topic(&self, channel_id: &str, topic: &str) -> Result<bool, ChannelError> {
        Ok(DiscordAdapter::set_topic(self, channel_id, topic).await?)
    }
}
