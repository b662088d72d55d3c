//! Reachability probe.
//!
//! Opens a remote session to the cluster login node (with bounded retries),
//! runs the status command exactly once, and always closes the session.
//! The transport sits behind [`RemoteShell`] so tests can substitute an
//! in-memory shell for SSH.

mod ssh;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use clusterwatch_adapters::ssh::CommandOutput;

use crate::config::ClusterConfig;
use crate::retry::Retry;

/// Why the cluster could not be observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("connection to {address} timed out")]
    ConnectionTimeout { address: String },

    #[error("connection to {address} refused: {reason}")]
    ConnectionRefused { address: String, reason: String },

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("status command failed: {0}")]
    CommandExecutionFailure(String),
}

impl ProbeError {
    /// Short machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::ConnectionTimeout { .. } => "connection_timeout",
            ProbeError::ConnectionRefused { .. } => "connection_refused",
            ProbeError::AuthFailure(_) => "auth_failure",
            ProbeError::CommandExecutionFailure(_) => "command_failure",
        }
    }

    /// Failures worth another connection attempt.
    pub fn is_connect_retryable(&self) -> bool {
        matches!(
            self,
            ProbeError::ConnectionTimeout { .. } | ProbeError::ConnectionRefused { .. }
        )
    }
}

/// Something that can open a command session on the cluster.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    type Session: RemoteSession;

    /// `host:port`, for logs.
    fn address(&self) -> String;

    /// Establish and authenticate one session.
    async fn connect(&self) -> Result<Self::Session, ProbeError>;
}

/// An open session.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run one command. A non-zero exit is reported in the output, not here.
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, ProbeError>;

    async fn close(self) -> Result<(), ProbeError>;
}

/// Run the configured status command and return its standard output.
///
/// Connection establishment is retried per [`ClusterConfig::connect_policy`];
/// the command itself runs at most once. A non-zero exit status or any
/// stderr output counts as [`ProbeError::CommandExecutionFailure`].
pub async fn probe<S: RemoteShell>(shell: &S, config: &ClusterConfig) -> Result<String, ProbeError> {
    let address = shell.address();
    debug!(%address, command = %config.command, "Probing cluster");

    let mut session = Retry::new(config.connect_policy(), "cluster connect")
        .when(ProbeError::is_connect_retryable)
        .run(|| shell.connect())
        .await
        .map_err(|e| e.into_inner())?;

    let result = session.exec(&config.command).await;

    if let Err(e) = session.close().await {
        debug!(%address, "Ignoring error while closing session: {}", e);
    }

    let output = result?;
    if !output.succeeded() {
        let reason = describe_failure(&output);
        warn!(%address, exit_status = ?output.exit_status, "Status command failed: {}", reason);
        return Err(ProbeError::CommandExecutionFailure(reason));
    }

    info!(%address, bytes = output.stdout.len(), "Cluster responded");
    Ok(output.stdout)
}

fn describe_failure(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    match (output.exit_status, stderr.is_empty()) {
        (Some(code), true) => format!("exit status {}", code),
        (Some(0) | None, false) => stderr.to_string(),
        (Some(code), false) => format!("exit status {}: {}", code, stderr),
        (None, true) => "unknown failure".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted shell for unit tests.

    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct Log {
        pub connects: u32,
        pub commands: Vec<String>,
        pub closes: u32,
    }

    /// Each `connect` pops the next scripted result; the session replays `output`.
    #[derive(Clone)]
    pub struct ScriptedShell {
        pub connects: Arc<Mutex<VecDeque<Result<(), ProbeError>>>>,
        pub output: Result<CommandOutput, ProbeError>,
        pub log: Arc<Mutex<Log>>,
    }

    impl ScriptedShell {
        pub fn new(
            connects: Vec<Result<(), ProbeError>>,
            output: Result<CommandOutput, ProbeError>,
        ) -> Self {
            Self {
                connects: Arc::new(Mutex::new(connects.into())),
                output,
                log: Arc::default(),
            }
        }
    }

    pub struct ScriptedSession {
        output: Result<CommandOutput, ProbeError>,
        log: Arc<Mutex<Log>>,
    }

    #[async_trait]
    impl RemoteShell for ScriptedShell {
        type Session = ScriptedSession;

        fn address(&self) -> String {
            "scripted:22".to_string()
        }

        async fn connect(&self) -> Result<ScriptedSession, ProbeError> {
            self.log.lock().connects += 1;
            let next = self.connects.lock().pop_front().unwrap_or(Ok(()));
            next.map(|_| ScriptedSession {
                output: self.output.clone(),
                log: Arc::clone(&self.log),
            })
        }
    }

    #[async_trait]
    impl RemoteSession for ScriptedSession {
        async fn exec(&mut self, command: &str) -> Result<CommandOutput, ProbeError> {
            self.log.lock().commands.push(command.to_string());
            self.output.clone()
        }

        async fn close(self) -> Result<(), ProbeError> {
            self.log.lock().closes += 1;
            Ok(())
        }
    }
}
