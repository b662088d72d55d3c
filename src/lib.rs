//! # clusterwatch
//!
//! Reports whether a compute cluster is reachable by keeping one live status
//! message in a chat channel.
//!
//! Each invocation is a single pass: connect to the cluster login node over
//! SSH and run `sinfo --summarize`, turn the output into a [`Snapshot`], read
//! the last status message back from the channel to learn what was announced
//! before, then either post a new message (the state changed) or edit the
//! existing one (it did not). The channel is the only state; nothing is
//! stored locally between invocations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  probe   │──▶│  parser  │──▶│ recovery  │──▶│ reconcile │──▶│ notifier │
//! │  (SSH)   │   │(Snapshot)│   │(last msg) │   │ (Action)  │   │ (chat)   │
//! └──────────┘   └──────────┘   └───────────┘   └───────────┘   └──────────┘
//!       ▲                             ▲                               │
//!       │                             └────────── ChatChannel ◀───────┘
//!  RemoteShell
//! ```
//!
//! - **[`probe`]**: [`RemoteShell`] transport trait and the probe itself
//! - **[`parser`]**: `sinfo` output to [`Snapshot`]
//! - **[`recovery`]**: reading the announced state back from the channel
//! - **[`reconcile`]**: choosing between posting and editing, body rendering
//! - **[`notifier`]**: applying the decision through a [`ChatChannel`]
//! - **[`monitor`]**: one pass tying it all together
//! - **[`config`]**: environment and file configuration
//! - **[`retry`]**: the bounded retry used by every network step
//!
//! ## Usage
//!
//! ```bash
//! # Configuration comes from the environment
//! export CLUSTER_HOST=cluster.example.org CLUSTER_USER=monitor CLUSTER_PASSWORD=...
//! export DISCORD_BOT_TOKEN=... DISCORD_BOT_CHANNEL_ID=... DISCORD_BOT_DEBUG_CHANNEL_ID=...
//! clusterwatch
//!
//! # Or from a file, with the environment taking precedence
//! clusterwatch --config clusterwatch.toml --debug --dry-run
//! ```
//!
//! ### As a library
//!
//! ```rust,no_run
//! use clusterwatch::{Config, Monitor};
//! use clusterwatch_adapters::discord::DiscordAdapter;
//! use clusterwatch_adapters::ssh::SshAdapter;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let shell = SshAdapter::builder()
//!     .host(&config.cluster.host)
//!     .credentials(&config.cluster.username, &config.cluster.password)
//!     .build();
//! let channel = DiscordAdapter::builder()
//!     .token(&config.discord.token)
//!     .build()?;
//!
//! let outcome = Monitor::new(config, shell, channel).run_once().await?;
//! println!("{} ({})", outcome.state, outcome.action);
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod monitor;
pub mod notifier;
pub mod parser;
pub mod probe;
pub mod reconcile;
pub mod recovery;
pub mod retry;

pub use channel::{ChannelError, ChatChannel};
pub use config::{Config, ConfigError};
pub use monitor::{Monitor, Outcome};
pub use notifier::{Applied, NotifyError, Notifier};
pub use probe::{probe, ProbeError, RemoteSession, RemoteShell};
pub use reconcile::{decide, Action, ActionKind};
pub use recovery::recover_last_state;
pub use retry::{Backoff, Retry, RetryError, RetryPolicy};

pub use clusterwatch_types::{
    ChannelMessage, ClusterState, MarkerSet, Notification, OutgoingMessage, PartitionInfo,
    Snapshot,
};
