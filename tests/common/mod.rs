//! In-memory cluster shell and chat channel shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use clusterwatch::probe::CommandOutput;
use clusterwatch::{
    ChannelError, ChannelMessage, ChatChannel, Config, OutgoingMessage, ProbeError, RemoteSession,
    RemoteShell,
};

pub const SINFO: &str = "\
PARTITION AVAIL  TIMELIMIT   NODES(A/I/O/T)  NODELIST
batch*       up 3-00:00:00       22/0/26/48  mscluster[11-58]
biggpu       up 3-00:00:00          2/1/0/3  mscluster[10,59-60]
";

pub fn config() -> Config {
    Config::from_toml(
        r#"
        cluster_host = "cluster.example.org"
        cluster_user = "monitor"
        cluster_password = "secret"
        discord_bot_token = "token"
        discord_bot_channel_id = "status"
        discord_bot_debug_channel_id = "status-debug"
        timezone = "UTC"
        "#,
    )
    .expect("test config is valid")
}

pub fn time(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ShellLog {
    pub connects: u32,
    pub commands: Vec<String>,
    pub closes: u32,
}

#[derive(Clone)]
pub struct FakeShell {
    connect_failures: Arc<Mutex<VecDeque<ProbeError>>>,
    output: CommandOutput,
    pub log: Arc<Mutex<ShellLog>>,
}

impl FakeShell {
    /// A shell whose status command prints `stdout` and exits 0.
    pub fn reachable(stdout: &str) -> Self {
        Self {
            connect_failures: Arc::default(),
            output: CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_status: Some(0),
            },
            log: Arc::default(),
        }
    }

    /// A shell that times out on every connection attempt.
    pub fn unreachable() -> Self {
        let shell = Self::reachable("");
        shell.connect_failures.lock().extend((0..100).map(|_| {
            ProbeError::ConnectionTimeout {
                address: "cluster.example.org:22".into(),
            }
        }));
        shell
    }
}

pub struct FakeSession {
    output: CommandOutput,
    log: Arc<Mutex<ShellLog>>,
}

#[async_trait]
impl RemoteShell for FakeShell {
    type Session = FakeSession;

    fn address(&self) -> String {
        "cluster.example.org:22".into()
    }

    async fn connect(&self) -> Result<FakeSession, ProbeError> {
        self.log.lock().connects += 1;
        if let Some(err) = self.connect_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(FakeSession {
            output: self.output.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, ProbeError> {
        self.log.lock().commands.push(command.to_string());
        Ok(self.output.clone())
    }

    async fn close(self) -> Result<(), ProbeError> {
        self.log.lock().closes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ChannelLog {
    pub messages: Vec<ChannelMessage>,
    pub posts: Vec<OutgoingMessage>,
    pub edits: u32,
    pub name: String,
    pub topic: Option<String>,
    pub failing_posts: u32,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct FakeChannel {
    pub log: Arc<Mutex<ChannelLog>>,
}

impl FakeChannel {
    /// Seed a message posted at `created_at`.
    pub fn seed(&self, content: &str, from_self: bool, created_at: DateTime<Utc>) -> String {
        let mut log = self.log.lock();
        log.next_id += 1;
        let id = format!("m{}", log.next_id);
        log.messages.push(ChannelMessage {
            id: id.clone(),
            channel_id: "status".into(),
            content: content.into(),
            created_at,
            from_self,
        });
        id
    }

    /// Make the next `n` posts fail with a server error.
    pub fn fail_posts(&self, n: u32) {
        self.log.lock().failing_posts = n;
    }

    pub fn latest_content(&self) -> Option<String> {
        self.log.lock().messages.last().map(|m| m.content.clone())
    }
}

#[async_trait]
impl ChatChannel for FakeChannel {
    async fn latest_message(
        &self,
        _channel_id: &str,
    ) -> Result<Option<ChannelMessage>, ChannelError> {
        Ok(self.log.lock().messages.last().cloned())
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<ChannelMessage, ChannelError> {
        let mut log = self.log.lock();
        log.posts.push(message.clone());
        if log.failing_posts > 0 {
            log.failing_posts -= 1;
            return Err(ChannelError::Transient("503 Service Unavailable".into()));
        }
        log.next_id += 1;
        let posted = ChannelMessage {
            id: format!("m{}", log.next_id),
            channel_id: channel_id.to_string(),
            content: message.content.clone(),
            created_at: time(0, 0),
            from_self: true,
        };
        log.messages.push(posted.clone());
        Ok(posted)
    }

    async fn edit_message(
        &self,
        _channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, ChannelError> {
        let mut log = self.log.lock();
        log.edits += 1;
        let message = log
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ChannelError::NotFound(message_id.to_string()))?;
        message.content = content.to_string();
        Ok(message.clone())
    }

    async fn rename_channel(&self, _channel_id: &str, name: &str) -> Result<bool, ChannelError> {
        let mut log = self.log.lock();
        if log.name == name {
            return Ok(false);
        }
        log.name = name.to_string();
        Ok(true)
    }

    async fn set_topic(&self, _channel_id: &str, topic: &str) -> Result<bool, ChannelError> {
        self.log.lock().topic = Some(topic.to_string());
        Ok(true)
    }
}
