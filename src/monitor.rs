//! One monitoring pass: probe, parse, recover, decide, apply.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use clusterwatch_types::ClusterState;

use crate::channel::ChatChannel;
use crate::config::Config;
use crate::notifier::{Applied, NotifyError, Notifier};
use crate::parser::parse_probe;
use crate::probe::{probe, RemoteShell};
use crate::reconcile::{decide, ActionKind};
use crate::recovery::recover_last_state;

/// Result of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: ClusterState,
    pub action: ActionKind,
    /// Id of the message now carrying the status; `None` on a dry run.
    pub message_id: Option<String>,
    pub applied: Applied,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Ties a cluster shell and a chat channel together under one [`Config`].
pub struct Monitor<S, C> {
    config: Config,
    shell: S,
    channel: C,
    clock: Clock,
}

impl<S: RemoteShell, C: ChatChannel> Monitor<S, C> {
    pub fn new(config: Config, shell: S, channel: C) -> Self {
        Self {
            config,
            shell,
            channel,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the wall clock used to timestamp observations.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run a single pass.
    ///
    /// Probe failures never fail the pass; they are announced as offline.
    /// Only a status message that cannot be written is an error.
    pub async fn run_once(&self) -> Result<Outcome, NotifyError> {
        let probed = probe(&self.shell, &self.config.cluster).await;
        if let Err(e) = &probed {
            warn!(kind = e.kind(), "Cluster unreachable: {}", e);
        }

        let snapshot = parse_probe(&probed, (self.clock)());
        info!(
            state = %snapshot.state,
            partitions = snapshot.partitions.len(),
            "Observed cluster"
        );

        let channel_id = self.config.discord.active_channel();
        let policy = self.config.discord.retry_policy();
        let display = &self.config.display;

        let prior = recover_last_state(&self.channel, channel_id, &display.markers, policy).await;
        let action = decide(&snapshot, prior.as_ref(), display);
        info!(
            action = %action.kind(),
            prior = ?prior.as_ref().map(|p| p.state),
            state = %action.state(),
            "Decided action"
        );

        let applied = Notifier::new(&self.channel, channel_id, display, policy)
            .dry_run(self.config.discord.dry_run)
            .apply(&action)
            .await?;

        Ok(Outcome {
            state: snapshot.state,
            action: action.kind(),
            message_id: applied.message_id().map(str::to_string),
            applied,
        })
    }
}

impl<S: fmt::Debug, C: fmt::Debug> fmt::Debug for Monitor<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("shell", &self.shell)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
