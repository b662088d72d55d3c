//! The binary cluster state.

use core::fmt;

/// Whether the cluster could be reached and queried.
///
/// There is deliberately no `Unknown` variant: a state is either derived
/// from a probe or recovered from a channel message, and "nothing recovered"
/// is expressed as `Option<ClusterState>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ClusterState {
    Online,
    Offline,
}

impl ClusterState {
    /// Upper-case label used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            ClusterState::Online => "ONLINE",
            ClusterState::Offline => "OFFLINE",
        }
    }

    /// Returns true for [`ClusterState::Online`].
    pub fn is_online(&self) -> bool {
        matches!(self, ClusterState::Online)
    }

    /// Pick the value matching this state.
    pub fn select<T>(&self, online: T, offline: T) -> T {
        match self {
            ClusterState::Online => online,
            ClusterState::Offline => offline,
        }
    }
}

impl From<bool> for ClusterState {
    fn from(online: bool) -> Self {
        if online {
            ClusterState::Online
        } else {
            ClusterState::Offline
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterState::Online => f.write_str("online"),
            ClusterState::Offline => f.write_str("offline"),
        }
    }
}
