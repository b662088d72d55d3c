//! Marker symbols - the persisted form of the last announced state.
//!
//! The status message itself is the system of record. Each message carries
//! exactly one of two symbols, and reading the latest message back gives the
//! state that was last announced.

use crate::ClusterState;

/// The pair of symbols that encode [`ClusterState`] inside message text.
///
/// # Precedence
///
/// A body may contain both symbols (someone edited it, or one symbol shows
/// up inside the probe output). [`MarkerSet::classify`] resolves this
/// deterministically: the symbol whose first occurrence starts at the lowest
/// byte offset wins. If both start at the same offset, one symbol is a prefix
/// of the other and the longer one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerSet {
    pub online: String,
    pub offline: String,
}

impl MarkerSet {
    /// Create a marker set.
    pub fn new(online: impl Into<String>, offline: impl Into<String>) -> Self {
        Self {
            online: online.into(),
            offline: offline.into(),
        }
    }

    /// The symbol announcing `state`.
    pub fn for_state(&self, state: ClusterState) -> &str {
        state.select(&self.online, &self.offline)
    }

    /// True when both symbols are non-empty and distinct.
    pub fn is_valid(&self) -> bool {
        !self.online.is_empty() && !self.offline.is_empty() && self.online != self.offline
    }

    /// Recover the announced state from a message body.
    ///
    /// Returns `None` when neither symbol is present.
    pub fn classify(&self, body: &str) -> Option<ClusterState> {
        let online = find(body, &self.online);
        let offline = find(body, &self.offline);

        match (online, offline) {
            (None, None) => None,
            (Some(_), None) => Some(ClusterState::Online),
            (None, Some(_)) => Some(ClusterState::Offline),
            (Some(on), Some(off)) if on < off => Some(ClusterState::Online),
            (Some(on), Some(off)) if off < on => Some(ClusterState::Offline),
            (Some(_), Some(_)) => {
                if self.online.len() >= self.offline.len() {
                    Some(ClusterState::Online)
                } else {
                    Some(ClusterState::Offline)
                }
            }
        }
    }
}

// Empty symbols never match.
fn find(body: &str, symbol: &str) -> Option<usize> {
    if symbol.is_empty() {
        return None;
    }
    body.find(symbol)
}
