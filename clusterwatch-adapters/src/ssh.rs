//! SSH adapter for running the cluster status command.
//!
//! The adapter opens a password-authenticated session to the login node,
//! runs a single command and closes the session. Connecting and running are
//! separate steps so callers can retry the connection without ever running
//! the command twice.
//!
//! ## Example
//!
//! ```rust,no_run
//! use clusterwatch_adapters::ssh::SshAdapter;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = SshAdapter::builder()
//!         .host("cluster.example.org")
//!         .port(22)
//!         .credentials("monitor", "secret")
//!         .connect_timeout(Duration::from_secs(10))
//!         .build();
//!
//!     let mut session = adapter.connect().await?;
//!     let output = session.exec("sinfo --summarize").await;
//!     session.close().await?;
//!
//!     let output = output?;
//!     println!("exit={:?}\n{}", output.exit_status, output.stdout);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;

use crate::AdapterError;

/// SSH adapter holding the connection settings for one host.
#[derive(Clone)]
pub struct SshAdapter {
    host: String,
    port: u16,
    username: String,
    password: String,
    connect_timeout: Duration,
    inactivity_timeout: Duration,
    host_key_fingerprint: Option<String>,
}

impl SshAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> SshAdapterBuilder {
        SshAdapterBuilder::default()
    }

    /// `host:port` of the remote end.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open and authenticate a session.
    ///
    /// Both the TCP/SSH handshake and the authentication exchange are bounded
    /// by the connect timeout.
    pub async fn connect(&self) -> Result<SshSession, AdapterError> {
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(self.inactivity_timeout),
            ..Default::default()
        });
        let handler = HostKeyCheck {
            expected: self.host_key_fingerprint.clone(),
        };

        let connect = client::connect(config, (self.host.as_str(), self.port), handler);
        let mut handle = match tokio::time::timeout(self.connect_timeout, connect).await {
            Err(_) => return Err(AdapterError::Timeout),
            Ok(Err(e)) => {
                return Err(AdapterError::Connection(format!(
                    "{}: {}",
                    self.address(),
                    e
                )))
            }
            Ok(Ok(handle)) => handle,
        };

        let auth = handle.authenticate_password(self.username.as_str(), self.password.as_str());
        let accepted = tokio::time::timeout(self.connect_timeout, auth)
            .await
            .map_err(|_| AdapterError::Timeout)?
            .map_err(|e| AdapterError::Auth(e.to_string()))?;

        if !accepted {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            return Err(AdapterError::Auth(format!(
                "password rejected for user '{}'",
                self.username
            )));
        }

        Ok(SshSession { handle })
    }
}

impl fmt::Debug for SshAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshAdapter")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for SshAdapter.
#[derive(Debug, Default)]
pub struct SshAdapterBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    connect_timeout: Option<Duration>,
    inactivity_timeout: Option<Duration>,
    host_key_fingerprint: Option<String>,
}

impl SshAdapterBuilder {
    /// Set the remote host name or address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the remote port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username and password for authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the connect and authentication timeout (default: 10 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set how long an idle session may stay open (default: 60 seconds).
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Only accept a server key with this SHA-256 fingerprint.
    ///
    /// Without a fingerprint any server key is accepted.
    pub fn host_key_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.host_key_fingerprint = fingerprint;
        self
    }

    /// Build the adapter.
    pub fn build(self) -> SshAdapter {
        SshAdapter {
            host: self.host.unwrap_or_else(|| "localhost".to_string()),
            port: self.port.unwrap_or(22),
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(10)),
            inactivity_timeout: self.inactivity_timeout.unwrap_or(Duration::from_secs(60)),
            host_key_fingerprint: self.host_key_fingerprint,
        }
    }
}

/// An authenticated session. Close it with [`SshSession::close`].
pub struct SshSession {
    handle: Handle<HostKeyCheck>,
}

impl SshSession {
    /// Run `command` and collect its output.
    ///
    /// A non-zero exit status is reported in [`CommandOutput::exit_status`],
    /// not as an error; only channel-level failures are errors.
    pub async fn exec(&mut self, command: &str) -> Result<CommandOutput, AdapterError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| AdapterError::Command(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| AdapterError::Command(format!("failed to start '{}': {}", command, e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                // Extended data type 1 is stderr.
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                _ => {}
            }
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }

    /// Disconnect the session.
    pub async fn close(self) -> Result<(), AdapterError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }
}

impl fmt::Debug for SshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshSession").finish_non_exhaustive()
    }
}

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the server closed the channel without reporting a status.
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    /// Exit status zero (or unreported) and nothing written to stderr.
    pub fn succeeded(&self) -> bool {
        self.exit_status.map_or(true, |code| code == 0) && self.stderr.trim().is_empty()
    }
}

/// Server key policy: accept anything unless a fingerprint is pinned.
struct HostKeyCheck {
    expected: Option<String>,
}

#[async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(match &self.expected {
            Some(expected) => fingerprint_matches(expected, &server_public_key.fingerprint()),
            None => true,
        })
    }
}

// Accepts both "SHA256:abc" and bare "abc".
fn fingerprint_matches(expected: &str, actual: &str) -> bool {
    let strip = |s: &str| s.trim().trim_start_matches("SHA256:").to_string();
    strip(expected) == strip(actual)
}
