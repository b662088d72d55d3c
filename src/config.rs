//! Configuration loading.
//!
//! Settings come from an optional TOML file overlaid by environment
//! variables, using the deployment variable names
//! (`CLUSTER_HOST`, `DISCORD_BOT_TOKEN`, ...). The flat [`Settings`] are
//! validated once into a typed [`Config`] which is then passed by reference
//! to every component; nothing reads the environment after startup.
//!
//! ```toml
//! cluster_host = "cluster.example.org"
//! cluster_user = "monitor"
//! cluster_password = "secret"
//! discord_bot_token = "..."
//! discord_bot_channel_id = "123456789"
//! discord_bot_debug_channel_id = "987654321"
//! timezone = "UTC"
//! ```

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use config::{Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use clusterwatch_types::{ClusterState, MarkerSet};

use crate::retry::RetryPolicy;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The underlying sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A required setting is missing or empty.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw settings as they appear in the environment (lower-cased) or file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cluster_host: String,
    #[serde(default = "defaults::port")]
    pub cluster_port: u16,
    #[serde(default)]
    pub cluster_user: String,
    #[serde(default)]
    pub cluster_password: String,
    #[serde(default = "defaults::connect_timeout")]
    pub cluster_connect_timeout: u64,
    #[serde(default = "defaults::connect_retries")]
    pub cluster_connect_retries: u32,
    #[serde(default = "defaults::connect_delay")]
    pub cluster_connect_delay: u64,
    #[serde(default = "defaults::command")]
    pub cluster_command: String,
    #[serde(default)]
    pub cluster_host_key: Option<String>,

    #[serde(default)]
    pub discord_bot_token: String,
    #[serde(default)]
    pub discord_bot_channel_id: String,
    #[serde(default)]
    pub discord_bot_debug_channel_id: String,
    #[serde(default)]
    pub discord_bot_debug: bool,
    #[serde(default = "defaults::webhook_name")]
    pub discord_bot_webhook_name: String,
    #[serde(default = "defaults::bot_timeout")]
    pub discord_bot_timeout: u64,
    #[serde(default = "defaults::bot_retries")]
    pub discord_bot_retries: u32,
    #[serde(default = "defaults::bot_retry_delay")]
    pub discord_bot_retry_delay: u64,
    #[serde(default = "defaults::api_url")]
    pub discord_api_url: String,
    #[serde(default)]
    pub discord_dry_run: bool,

    #[serde(default = "defaults::username")]
    pub discord_user_on: String,
    #[serde(default = "defaults::username")]
    pub discord_user_off: String,
    #[serde(default = "defaults::img_on")]
    pub discord_img_on: String,
    #[serde(default = "defaults::img_off")]
    pub discord_img_off: String,
    #[serde(default = "defaults::emoji_on")]
    pub discord_emoji_on: String,
    #[serde(default = "defaults::emoji_off")]
    pub discord_emoji_off: String,
    #[serde(default = "defaults::channel_name_on")]
    pub discord_channel_name_on: String,
    #[serde(default = "defaults::channel_name_off")]
    pub discord_channel_name_off: String,
    #[serde(default)]
    pub discord_channel_topic_on: Option<String>,
    #[serde(default)]
    pub discord_channel_topic_off: Option<String>,
    #[serde(default = "defaults::enabled")]
    pub discord_rename_channel: bool,
    #[serde(default = "defaults::enabled")]
    pub discord_msg_info: bool,

    #[serde(default = "defaults::timezone")]
    pub timezone: String,
}

mod defaults {
    pub fn port() -> u16 {
        22
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn connect_retries() -> u32 {
        5
    }
    pub fn connect_delay() -> u64 {
        2
    }
    pub fn command() -> String {
        "sinfo --summarize".to_string()
    }
    pub fn webhook_name() -> String {
        "[BOT] Cluster Status Hook [DO-NOT-EDIT]".to_string()
    }
    pub fn bot_timeout() -> u64 {
        30
    }
    pub fn bot_retries() -> u32 {
        3
    }
    pub fn bot_retry_delay() -> u64 {
        1
    }
    pub fn api_url() -> String {
        "https://discord.com/api/v10".to_string()
    }
    pub fn username() -> String {
        "Cluster Status".to_string()
    }
    pub fn img_on() -> String {
        "https://raw.githubusercontent.com/nmichlo/uploads/main/imgs/avatar/cat_happy.jpg"
            .to_string()
    }
    pub fn img_off() -> String {
        "https://raw.githubusercontent.com/nmichlo/uploads/main/imgs/avatar/cat_glum.jpg"
            .to_string()
    }
    pub fn emoji_on() -> String {
        "🌞".to_string()
    }
    pub fn emoji_off() -> String {
        "⛈".to_string()
    }
    pub fn channel_name_on() -> String {
        "cluster-status-🌞".to_string()
    }
    pub fn channel_name_off() -> String {
        "cluster-status-⛈".to_string()
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn timezone() -> String {
        "Africa/Johannesburg".to_string()
    }
}

/// Complete, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub discord: DiscordConfig,
    pub display: DisplayConfig,
}

/// Remote session settings.
#[derive(Clone)]
pub struct ClusterConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub connect_retries: u32,
    pub connect_delay: Duration,
    /// The status command, run once per invocation.
    pub command: String,
    /// Pinned SHA-256 server key fingerprint, if any.
    pub host_key: Option<String>,
}

impl ClusterConfig {
    /// Policy for establishing the remote session.
    pub fn connect_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.connect_retries, self.connect_delay)
    }
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("connect_timeout", &self.connect_timeout)
            .field("connect_retries", &self.connect_retries)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// Chat API settings.
#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub channel_id: String,
    pub debug_channel_id: String,
    /// Post to the debug channel instead of the production one.
    pub debug: bool,
    pub webhook_name: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub api_base: String,
    /// Log actions instead of performing them.
    pub dry_run: bool,
}

impl DiscordConfig {
    /// The channel selected by the debug flag.
    pub fn active_channel(&self) -> &str {
        if self.debug {
            &self.debug_channel_id
        } else {
            &self.channel_id
        }
    }

    /// Policy for every chat API call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.retries, self.retry_delay, Duration::from_secs(30))
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("channel_id", &self.channel_id)
            .field("debug_channel_id", &self.debug_channel_id)
            .field("debug", &self.debug)
            .field("webhook_name", &self.webhook_name)
            .field("retries", &self.retries)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// How status messages look.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub markers: MarkerSet,
    pub username_on: String,
    pub username_off: String,
    pub avatar_on: String,
    pub avatar_off: String,
    pub channel_name_on: String,
    pub channel_name_off: String,
    pub topic_on: Option<String>,
    pub topic_off: Option<String>,
    pub rename_channel: bool,
    /// Append the partition table to online messages.
    pub append_info: bool,
    pub timezone: Tz,
}

impl DisplayConfig {
    pub fn username(&self, state: ClusterState) -> &str {
        state.select(&self.username_on, &self.username_off)
    }

    pub fn avatar_url(&self, state: ClusterState) -> &str {
        state.select(&self.avatar_on, &self.avatar_off)
    }

    pub fn channel_name(&self, state: ClusterState) -> &str {
        state.select(&self.channel_name_on, &self.channel_name_off)
    }

    pub fn topic(&self, state: ClusterState) -> Option<&str> {
        state
            .select(&self.topic_on, &self.topic_off)
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            markers: MarkerSet::new(defaults::emoji_on(), defaults::emoji_off()),
            username_on: defaults::username(),
            username_off: defaults::username(),
            avatar_on: defaults::img_on(),
            avatar_off: defaults::img_off(),
            channel_name_on: defaults::channel_name_on(),
            channel_name_off: defaults::channel_name_off(),
            topic_on: None,
            topic_off: None,
            rename_channel: true,
            append_info: true,
            timezone: chrono_tz::Africa::Johannesburg,
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let raw = builder.add_source(Environment::default()).build()?;
        Self::from_settings(raw.try_deserialize()?)
    }

    /// Load from a TOML document only.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let raw = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(raw.try_deserialize()?)
    }

    /// Validate raw settings.
    pub fn from_settings(s: Settings) -> Result<Self, ConfigError> {
        let cluster = ClusterConfig {
            host: required("CLUSTER_HOST", s.cluster_host)?,
            port: s.cluster_port,
            username: required("CLUSTER_USER", s.cluster_user)?,
            password: secret("CLUSTER_PASSWORD", s.cluster_password)?,
            connect_timeout: Duration::from_secs(s.cluster_connect_timeout),
            connect_retries: at_least_one("CLUSTER_CONNECT_RETRIES", s.cluster_connect_retries)?,
            connect_delay: Duration::from_secs(s.cluster_connect_delay),
            command: required("CLUSTER_COMMAND", s.cluster_command)?,
            host_key: s.cluster_host_key.filter(|k| !k.trim().is_empty()),
        };

        let discord = DiscordConfig {
            token: secret("DISCORD_BOT_TOKEN", s.discord_bot_token)?,
            channel_id: required("DISCORD_BOT_CHANNEL_ID", s.discord_bot_channel_id)?,
            debug_channel_id: required(
                "DISCORD_BOT_DEBUG_CHANNEL_ID",
                s.discord_bot_debug_channel_id,
            )?,
            debug: s.discord_bot_debug,
            webhook_name: required("DISCORD_BOT_WEBHOOK_NAME", s.discord_bot_webhook_name)?,
            timeout: Duration::from_secs(s.discord_bot_timeout),
            retries: at_least_one("DISCORD_BOT_RETRIES", s.discord_bot_retries)?,
            retry_delay: Duration::from_secs(s.discord_bot_retry_delay),
            api_base: required("DISCORD_API_URL", s.discord_api_url)?,
            dry_run: s.discord_dry_run,
        };

        let markers = MarkerSet::new(s.discord_emoji_on, s.discord_emoji_off);
        if !markers.is_valid() {
            return Err(ConfigError::Invalid {
                key: "DISCORD_EMOJI_ON/DISCORD_EMOJI_OFF",
                reason: "markers must be non-empty and distinct".to_string(),
            });
        }

        let timezone: Tz = s.timezone.parse().map_err(|e| ConfigError::Invalid {
            key: "TIMEZONE",
            reason: format!("{}", e),
        })?;

        let display = DisplayConfig {
            markers,
            username_on: s.discord_user_on,
            username_off: s.discord_user_off,
            avatar_on: s.discord_img_on,
            avatar_off: s.discord_img_off,
            channel_name_on: s.discord_channel_name_on,
            channel_name_off: s.discord_channel_name_off,
            topic_on: s.discord_channel_topic_on,
            topic_off: s.discord_channel_topic_off,
            rename_channel: s.discord_rename_channel,
            append_info: s.discord_msg_info,
            timezone,
        };

        Ok(Self {
            cluster,
            discord,
            display,
        })
    }

    /// Apply command-line overrides. Flags can only switch modes on.
    pub fn with_overrides(mut self, dry_run: bool, debug: bool) -> Self {
        self.discord.dry_run |= dry_run;
        self.discord.debug |= debug;
        self
    }
}

fn required(key: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(value)
    }
}

// Credentials are used verbatim; surrounding whitespace may be significant.
fn secret(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(value)
    }
}

fn at_least_one(key: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::Invalid {
            key,
            reason: "must be at least 1".to_string(),
        })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        cluster_host = "cluster.example.org"
        cluster_user = "monitor"
        cluster_password = "secret"
        discord_bot_token = "token"
        discord_bot_channel_id = "111"
        discord_bot_debug_channel_id = "222"
    "#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.cluster.port, 22);
        assert_eq!(config.cluster.connect_retries, 5);
        assert_eq!(config.cluster.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.cluster.command, "sinfo --summarize");
        assert_eq!(config.discord.retries, 3);
        assert_eq!(config.discord.active_channel(), "111");
        assert!(!config.discord.dry_run);
        assert_eq!(config.display.timezone, chrono_tz::Africa::Johannesburg);
        assert_eq!(config.display.markers, MarkerSet::new("🌞", "⛈"));
        assert!(config.display.rename_channel);
        assert!(config.display.append_info);
        assert_eq!(config.display.topic(ClusterState::Online), None);
    }

    #[test]
    fn test_debug_channel_selection() {
        let toml = format!("{}\ndiscord_bot_debug = true\n", MINIMAL);
        let config = Config::from_toml(&toml).unwrap();
        assert_eq!(config.discord.active_channel(), "222");

        let config = Config::from_toml(MINIMAL).unwrap().with_overrides(false, true);
        assert_eq!(config.discord.active_channel(), "222");
    }

    #[test]
    fn test_credentials_are_not_trimmed() {
        let toml = MINIMAL
            .replace("\"secret\"", "\"  pass word  \"")
            .replace("\"token\"", "\" token \"")
            .replace("\"cluster.example.org\"", "\"  cluster.example.org \"");
        let config = Config::from_toml(&toml).unwrap();

        assert_eq!(config.cluster.password, "  pass word  ");
        assert_eq!(config.discord.token, " token ");
        assert_eq!(config.cluster.host, "cluster.example.org");
    }

    #[test]
    fn test_blank_password_is_missing() {
        let toml = MINIMAL.replace("\"secret\"", "\"   \"");
        assert!(matches!(
            Config::from_toml(&toml),
            Err(ConfigError::Missing("CLUSTER_PASSWORD"))
        ));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_toml(r#"cluster_host = "h""#).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLUSTER_USER")));
    }

    #[test]
    fn test_invalid_timezone() {
        let toml = format!("{}\ntimezone = \"Mars/Olympus\"\n", MINIMAL);
        let err = Config::from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIMEZONE", .. }));
    }

    #[test]
    fn test_identical_markers_rejected() {
        let toml = format!(
            "{}\ndiscord_emoji_on = \"x\"\ndiscord_emoji_off = \"x\"\n",
            MINIMAL
        );
        assert!(matches!(
            Config::from_toml(&toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let toml = format!("{}\ndiscord_bot_retries = 0\n", MINIMAL);
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn test_per_state_display() {
        let toml = format!(
            "{}\ndiscord_user_off = \"Cluster Down\"\ndiscord_channel_topic_off = \"down\"\n",
            MINIMAL
        );
        let display = Config::from_toml(&toml).unwrap().display;
        assert_eq!(display.username(ClusterState::Online), "Cluster Status");
        assert_eq!(display.username(ClusterState::Offline), "Cluster Down");
        assert_eq!(display.channel_name(ClusterState::Offline), "cluster-status-⛈");
        assert_eq!(display.topic(ClusterState::Offline), Some("down"));
        assert_eq!(display.topic(ClusterState::Online), None);
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let config = Config::from_toml(MINIMAL).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("\"token\""));
    }

    #[test]
    fn test_overrides_only_enable() {
        let toml = format!("{}\ndiscord_dry_run = true\n", MINIMAL);
        let config = Config::from_toml(&toml).unwrap().with_overrides(false, false);
        assert!(config.discord.dry_run);
    }
}
