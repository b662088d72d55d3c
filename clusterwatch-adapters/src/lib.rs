//! # clusterwatch-adapters
//!
//! Concrete transports used by clusterwatch.
//!
//! ## Supported Systems
//!
//! - **SSH** (`ssh` feature) - Opens a password-authenticated session to the
//!   cluster login node and runs one status command
//! - **Discord** (`discord` feature) - Reads the latest message of a channel
//!   and posts/edits status messages through a channel webhook
//!
//! ## Quick Start (SSH)
//!
//! ```rust,no_run
//! # #[cfg(feature = "ssh")]
//! # async fn demo() -> Result<(), clusterwatch_adapters::AdapterError> {
//! use clusterwatch_adapters::ssh::SshAdapter;
//!
//! let adapter = SshAdapter::builder()
//!     .host("cluster.example.org")
//!     .credentials("monitor", "secret")
//!     .build();
//!
//! let mut session = adapter.connect().await?;
//! let output = session.exec("sinfo --summarize").await;
//! session.close().await?;
//! println!("{}", output?.stdout);
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick Start (Discord)
//!
//! ```rust,no_run
//! # #[cfg(feature = "discord")]
//! # async fn demo() -> Result<(), clusterwatch_adapters::AdapterError> {
//! use clusterwatch_adapters::discord::DiscordAdapter;
//!
//! let adapter = DiscordAdapter::builder().token("bot-token").build()?;
//! if let Some(message) = adapter.latest_message("123456789").await? {
//!     println!("last status: {}", message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;

#[cfg(feature = "ssh")]
pub mod ssh;

#[cfg(feature = "discord")]
pub mod discord;

pub use error::AdapterError;

// Re-export types for convenience
pub use clusterwatch_types::{ChannelMessage, OutgoingMessage};
