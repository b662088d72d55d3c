//! Discord adapter using the REST API (v10).
//!
//! Status messages are posted through a channel webhook rather than as the
//! bot user, so the display name and avatar can follow the cluster state.
//! The webhook is looked up by name and created on first post. A message
//! counts as ours ([`ChannelMessage::from_self`]) when that webhook posted it.
//!
//! ## Endpoints Used
//!
//! - `GET /channels/{id}/messages?limit=1` - latest message
//! - `GET|POST /channels/{id}/webhooks` - find or create the status webhook
//! - `POST /webhooks/{id}/{token}?wait=true` - post a message
//! - `PATCH /webhooks/{id}/{token}/messages/{message}` - edit a message
//! - `GET|PATCH /channels/{id}` - rename the channel or set its topic
//!
//! ## Example
//!
//! ```rust,no_run
//! use clusterwatch_adapters::discord::DiscordAdapter;
//! use clusterwatch_adapters::OutgoingMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = DiscordAdapter::builder()
//!         .token("bot-token")
//!         .webhook_name("[BOT] Cluster Status Hook [DO-NOT-EDIT]")
//!         .build()?;
//!
//!     let posted = adapter
//!         .post_message("123456789", &OutgoingMessage::new("🌞  **ONLINE**"))
//!         .await?;
//!     adapter.edit_message("123456789", &posted.id, "🌞  **ONLINE**  |  5m 0s").await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use clusterwatch_types::{ChannelMessage, OutgoingMessage};

use crate::AdapterError;

/// Default REST base URL.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Default name of the webhook used for status messages.
pub const DEFAULT_WEBHOOK_NAME: &str = "[BOT] Cluster Status Hook [DO-NOT-EDIT]";

/// Discord adapter for reading and writing status messages.
#[derive(Clone)]
pub struct DiscordAdapter {
    client: Client,
    api_base: String,
    token: String,
    webhook_name: String,
    /// Webhooks resolved so far, keyed by channel id.
    webhooks: Arc<Mutex<HashMap<String, Webhook>>>,
}

impl DiscordAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> DiscordAdapterBuilder {
        DiscordAdapterBuilder::default()
    }

    /// Fetch the most recent message in a channel.
    ///
    /// Returns `Ok(None)` for an empty channel.
    pub async fn latest_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelMessage>, AdapterError> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", "1")])
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let messages: Vec<WireMessage> = parse_json(check(response).await?).await?;
        let Some(latest) = messages.into_iter().next() else {
            return Ok(None);
        };

        let webhook = self.find_webhook(channel_id).await?;
        Ok(Some(latest.into_channel_message(webhook.as_ref())))
    }

    /// Post a new message through the status webhook.
    pub async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<ChannelMessage, AdapterError> {
        let webhook = self.ensure_webhook(channel_id).await?;
        let url = format!("{}/webhooks/{}/{}", self.api_base, webhook.id, webhook.token()?);

        let response = self
            .client
            .post(&url)
            .query(&[("wait", "true")])
            .json(message)
            .send()
            .await?;

        let posted: WireMessage = parse_json(check(response).await?).await?;
        Ok(posted.into_channel_message(Some(&webhook)))
    }

    /// Replace the content of a message previously posted by the webhook.
    ///
    /// Fails with [`AdapterError::NotFound`] when the message was deleted.
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, AdapterError> {
        let webhook = self.ensure_webhook(channel_id).await?;
        let url = format!(
            "{}/webhooks/{}/{}/messages/{}",
            self.api_base,
            webhook.id,
            webhook.token()?,
            message_id
        );

        let response = self
            .client
            .patch(&url)
            .json(&EditBody { content })
            .send()
            .await?;

        let edited: WireMessage = parse_json(check(response).await?).await?;
        Ok(edited.into_channel_message(Some(&webhook)))
    }

    /// Rename a channel. Returns `false` if it already had that name.
    pub async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<bool, AdapterError> {
        let channel = self.fetch_channel(channel_id).await?;
        if channel.name.as_deref() == Some(name) {
            return Ok(false);
        }
        self.patch_channel(channel_id, &ChannelPatch { name: Some(name), topic: None })
            .await?;
        Ok(true)
    }

    /// Set a channel topic. Returns `false` if it already had that topic.
    pub async fn set_topic(&self, channel_id: &str, topic: &str) -> Result<bool, AdapterError> {
        let channel = self.fetch_channel(channel_id).await?;
        if channel.topic.as_deref() == Some(topic) {
            return Ok(false);
        }
        self.patch_channel(channel_id, &ChannelPatch { name: None, topic: Some(topic) })
            .await?;
        Ok(true)
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<WireChannel, AdapterError> {
        let url = format!("{}/channels/{}", self.api_base, channel_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        parse_json(check(response).await?).await
    }

    async fn patch_channel(
        &self,
        channel_id: &str,
        patch: &ChannelPatch<'_>,
    ) -> Result<(), AdapterError> {
        let url = format!("{}/channels/{}", self.api_base, channel_id);
        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Look up the status webhook without creating it.
    async fn find_webhook(&self, channel_id: &str) -> Result<Option<Webhook>, AdapterError> {
        let cached = self.webhooks.lock().get(channel_id).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let url = format!("{}/channels/{}/webhooks", self.api_base, channel_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let webhooks: Vec<Webhook> = parse_json(check(response).await?).await?;
        let found = webhooks
            .into_iter()
            .find(|w| w.name.as_deref() == Some(self.webhook_name.as_str()));

        if let Some(webhook) = &found {
            self.webhooks
                .lock()
                .insert(channel_id.to_string(), webhook.clone());
        }
        Ok(found)
    }

    /// Look up the status webhook, creating it if the channel has none.
    async fn ensure_webhook(&self, channel_id: &str) -> Result<Webhook, AdapterError> {
        if let Some(webhook) = self.find_webhook(channel_id).await? {
            return Ok(webhook);
        }

        let url = format!("{}/channels/{}/webhooks", self.api_base, channel_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&CreateWebhook {
                name: &self.webhook_name,
            })
            .send()
            .await?;

        let webhook: Webhook = parse_json(check(response).await?).await?;
        self.webhooks
            .lock()
            .insert(channel_id.to_string(), webhook.clone());
        Ok(webhook)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

impl fmt::Debug for DiscordAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordAdapter")
            .field("api_base", &self.api_base)
            .field("webhook_name", &self.webhook_name)
            .finish_non_exhaustive()
    }
}

/// Builder for DiscordAdapter.
#[derive(Debug, Default)]
pub struct DiscordAdapterBuilder {
    api_base: Option<String>,
    token: Option<String>,
    webhook_name: Option<String>,
    timeout: Option<Duration>,
}

impl DiscordAdapterBuilder {
    /// Set the REST base URL (default: [`DEFAULT_API_BASE`]).
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the bot token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the webhook name to find or create (default: [`DEFAULT_WEBHOOK_NAME`]).
    pub fn webhook_name(mut self, name: impl Into<String>) -> Self {
        self.webhook_name = Some(name.into());
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<DiscordAdapter, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(DiscordAdapter {
            client,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: self.token.unwrap_or_default(),
            webhook_name: self
                .webhook_name
                .unwrap_or_else(|| DEFAULT_WEBHOOK_NAME.to_string()),
            webhooks: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}

/// Map non-success statuses to adapter errors.
async fn check(response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_wait = retry_after_header(&response);
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AdapterError::Auth(format!("API returned status {}", status))
        }
        StatusCode::NOT_FOUND => AdapterError::NotFound(body),
        StatusCode::TOO_MANY_REQUESTS => AdapterError::RateLimited {
            retry_after: retry_after_body(&body).or(header_wait),
            message: body,
        },
        _ => AdapterError::Api {
            status: status.as_u16(),
            message: body,
        },
    })
}

/// `Retry-After` header, in seconds.
fn retry_after_header(response: &Response) -> Option<Duration> {
    let value = response.headers().get(reqwest::header::RETRY_AFTER)?;
    seconds(value.to_str().ok()?.trim().parse().ok()?)
}

/// `retry_after` field of a rate-limit body, in (fractional) seconds.
fn retry_after_body(body: &str) -> Option<Duration> {
    #[derive(Deserialize)]
    struct RateLimitBody {
        retry_after: f64,
    }

    let parsed: RateLimitBody = serde_json::from_str(body).ok()?;
    seconds(parsed.retry_after)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AdapterError> {
    response
        .json()
        .await
        .map_err(|e| AdapterError::Parse(e.to_string()))
}

/// Webhook object from the Discord API.
#[derive(Debug, Clone, Deserialize)]
struct Webhook {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl Webhook {
    fn token(&self) -> Result<&str, AdapterError> {
        self.token.as_deref().ok_or_else(|| {
            AdapterError::Auth(format!("webhook {} has no token visible to this bot", self.id))
        })
    }
}

/// Message object from the Discord API.
#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    channel_id: String,
    #[serde(default)]
    content: String,
    timestamp: DateTime<Utc>,
    author: WireAuthor,
    #[serde(default)]
    webhook_id: Option<String>,
}

impl WireMessage {
    fn into_channel_message(self, webhook: Option<&Webhook>) -> ChannelMessage {
        let from_self = webhook.is_some_and(|w| {
            self.webhook_id.as_deref() == Some(w.id.as_str()) || self.author.id == w.id
        });
        ChannelMessage {
            id: self.id,
            channel_id: self.channel_id,
            content: self.content,
            created_at: self.timestamp,
            from_self,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAuthor {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Serialize)]
struct EditBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateWebhook<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ChannelPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
}
