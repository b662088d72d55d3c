//! Recovering the last announced state from the channel itself.
//!
//! There is no local storage: the most recent message in the channel is the
//! record of what was last announced. Recovery never fails the invocation;
//! if the channel cannot be read, the monitor behaves as if nothing had
//! been announced and posts a fresh message.

use tracing::{debug, info, warn};

use clusterwatch_types::{MarkerSet, Notification};

use crate::channel::{ChannelError, ChatChannel};
use crate::retry::{Retry, RetryPolicy};

/// Read back the last status message posted by this system, if any.
pub async fn recover_last_state<C: ChatChannel + ?Sized>(
    channel: &C,
    channel_id: &str,
    markers: &MarkerSet,
    policy: RetryPolicy,
) -> Option<Notification> {
    let latest = Retry::new(policy, "fetch latest message")
        .when(ChannelError::is_transient)
        .run(|| channel.latest_message(channel_id))
        .await;

    let message = match latest {
        Ok(Some(message)) => message,
        Ok(None) => {
            info!(channel_id, "Channel is empty, no prior state");
            return None;
        }
        Err(e) => {
            warn!(
                channel_id,
                attempts = e.attempts,
                "Could not read channel, assuming no prior state: {}",
                e.error
            );
            return None;
        }
    };

    if !message.from_self {
        info!(
            channel_id,
            message_id = %message.id,
            "Latest message was not posted by us, no prior state"
        );
        return None;
    }

    match message.as_notification(markers) {
        Some(prior) => {
            debug!(
                channel_id,
                message_id = %prior.message_id,
                state = %prior.state,
                "Recovered prior state"
            );
            Some(prior)
        }
        None => {
            info!(
                channel_id,
                message_id = %message.id,
                "Latest message carries no status marker, no prior state"
            );
            None
        }
    }
}
