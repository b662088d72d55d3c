//! Carrying out an [`Action`] against the chat channel.
//!
//! Posting and editing are the essential writes and fail the invocation once
//! retries are exhausted. Renaming the channel and setting its topic are
//! cosmetic: failures are logged and otherwise ignored.

use thiserror::Error;
use tracing::{error, info, warn};

use clusterwatch_types::{ClusterState, OutgoingMessage};

use crate::channel::{ChannelError, ChatChannel};
use crate::config::DisplayConfig;
use crate::reconcile::Action;
use crate::retry::{Retry, RetryPolicy};

/// A status message could not be written.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to {operation} status message after {attempts} attempt(s): {source}")]
    Write {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: ChannelError,
    },
}

/// What was actually written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Posted { message_id: String },
    Edited { message_id: String },
    /// The message to edit was gone, so a new one was posted.
    Reposted { replaced: String, message_id: String },
    /// Dry run: nothing was written.
    Skipped,
}

impl Applied {
    /// Id of the message now carrying the status.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Applied::Posted { message_id }
            | Applied::Edited { message_id }
            | Applied::Reposted { message_id, .. } => Some(message_id),
            Applied::Skipped => None,
        }
    }
}

/// Writes status messages to one channel.
pub struct Notifier<'a, C: ?Sized> {
    channel: &'a C,
    channel_id: &'a str,
    display: &'a DisplayConfig,
    policy: RetryPolicy,
    dry_run: bool,
}

impl<'a, C: ChatChannel + ?Sized> Notifier<'a, C> {
    pub fn new(
        channel: &'a C,
        channel_id: &'a str,
        display: &'a DisplayConfig,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            channel,
            channel_id,
            display,
            policy,
            dry_run: false,
        }
    }

    /// Log actions instead of performing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn apply(&self, action: &Action) -> Result<Applied, NotifyError> {
        if self.dry_run {
            info!(
                channel_id = self.channel_id,
                action = %action.kind(),
                state = %action.state(),
                "Dry run, not writing:\n{}",
                action.body()
            );
            return Ok(Applied::Skipped);
        }

        match action {
            Action::PostNew { state, body } => {
                let message_id = self.post(*state, body).await?;
                self.decorate(*state).await;
                Ok(Applied::Posted { message_id })
            }
            Action::UpdateInPlace {
                message_id,
                state,
                body,
            } => match self.edit(message_id, body).await? {
                Some(edited) => Ok(Applied::Edited { message_id: edited }),
                None => {
                    warn!(
                        channel_id = self.channel_id,
                        %message_id,
                        "Status message no longer exists, posting a new one"
                    );
                    let new_id = self.post(*state, body).await?;
                    self.decorate(*state).await;
                    Ok(Applied::Reposted {
                        replaced: message_id.clone(),
                        message_id: new_id,
                    })
                }
            },
        }
    }

    async fn post(&self, state: ClusterState, body: &str) -> Result<String, NotifyError> {
        let message = OutgoingMessage::new(body)
            .username(self.display.username(state))
            .avatar_url(self.display.avatar_url(state));

        let posted = Retry::new(self.policy, "post status message")
            .when(ChannelError::is_transient)
            .run(|| self.channel.post_message(self.channel_id, &message))
            .await
            .map_err(|e| {
                error!(channel_id = self.channel_id, "Giving up on posting: {}", e.error);
                NotifyError::Write {
                    operation: "post",
                    attempts: e.attempts,
                    source: e.error,
                }
            })?;

        info!(
            channel_id = self.channel_id,
            message_id = %posted.id,
            %state,
            "Posted status message"
        );
        Ok(posted.id)
    }

    // `Ok(None)` when the message no longer exists.
    async fn edit(&self, message_id: &str, body: &str) -> Result<Option<String>, NotifyError> {
        let result = Retry::new(self.policy, "edit status message")
            .when(ChannelError::is_transient)
            .run(|| self.channel.edit_message(self.channel_id, message_id, body))
            .await;

        match result {
            Ok(edited) => {
                info!(
                    channel_id = self.channel_id,
                    message_id = %edited.id,
                    "Updated status message"
                );
                Ok(Some(edited.id))
            }
            Err(e) if e.error.is_not_found() => Ok(None),
            Err(e) => {
                error!(channel_id = self.channel_id, %message_id, "Giving up on editing: {}", e.error);
                Err(NotifyError::Write {
                    operation: "edit",
                    attempts: e.attempts,
                    source: e.error,
                })
            }
        }
    }

    // Channel name and topic follow the announced state.
    async fn decorate(&self, state: ClusterState) {
        if self.display.rename_channel {
            let name = self.display.channel_name(state);
            let renamed = Retry::new(self.policy, "rename channel")
                .when(ChannelError::is_transient)
                .run(|| self.channel.rename_channel(self.channel_id, name))
                .await;
            match renamed {
                Ok(true) => info!(channel_id = self.channel_id, name, "Renamed channel"),
                Ok(false) => {}
                Err(e) => warn!(
                    channel_id = self.channel_id,
                    name, "Could not rename channel: {}", e.error
                ),
            }
        }

        if let Some(topic) = self.display.topic(state) {
            let updated = Retry::new(self.policy, "set channel topic")
                .when(ChannelError::is_transient)
                .run(|| self.channel.set_topic(self.channel_id, topic))
                .await;
            match updated {
                Ok(true) => info!(channel_id = self.channel_id, topic, "Updated channel topic"),
                Ok(false) => {}
                Err(e) => warn!(
                    channel_id = self.channel_id,
                    "Could not set channel topic: {}", e.error
                ),
            }
        }
    }
}
