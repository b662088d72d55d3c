//! Snapshot - the result of one probe-and-parse cycle.

use chrono::{DateTime, Utc};

use crate::ClusterState;

/// A point-in-time view of the cluster.
///
/// One snapshot is produced per invocation and never modified afterwards.
///
/// # Example
///
/// ```rust
/// use clusterwatch_types::{ClusterState, Snapshot};
///
/// let snapshot = Snapshot::builder()
///     .state(ClusterState::Offline)
///     .detail("connection refused")
///     .build();
///
/// assert!(!snapshot.is_online());
/// assert!(snapshot.partitions.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Online if the status command ran, offline otherwise.
    pub state: ClusterState,

    /// Partitions in the order the status command listed them.
    pub partitions: Vec<PartitionInfo>,

    /// When the probe finished.
    pub observed_at: DateTime<Utc>,

    /// Why the probe failed, for offline snapshots.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub detail: Option<String>,
}

impl Snapshot {
    /// An online snapshot with the given partitions.
    pub fn online(partitions: Vec<PartitionInfo>, observed_at: DateTime<Utc>) -> Self {
        Self {
            state: ClusterState::Online,
            partitions,
            observed_at,
            detail: None,
        }
    }

    /// An offline snapshot without partitions.
    pub fn offline(observed_at: DateTime<Utc>) -> Self {
        Self {
            state: ClusterState::Offline,
            partitions: Vec::new(),
            observed_at,
            detail: None,
        }
    }

    /// Attach a failure description.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    /// Look up a partition by name.
    pub fn partition(&self, name: &str) -> Option<&PartitionInfo> {
        self.partitions.iter().find(|p| p.name == name)
    }
}

/// One row of the status command output.
///
/// Fields are kept verbatim; only [`PartitionInfo::node_counts`] interprets
/// anything, and only for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionInfo {
    /// Partition name with the default marker (`*`) stripped.
    pub name: String,

    /// True if the name carried the `*` default marker.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_default: bool,

    /// Availability column, e.g. `up`.
    pub avail: String,

    /// Time limit column, e.g. `3-00:00:00`.
    pub timelimit: String,

    /// Node summary column in `A/I/O/T` form.
    pub nodes: String,

    /// Node list column, e.g. `node[01-10]`.
    pub nodelist: String,
}

impl PartitionInfo {
    /// Create a partition with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Interpret the `A/I/O/T` node column.
    pub fn node_counts(&self) -> Option<NodeCounts> {
        NodeCounts::parse(&self.nodes)
    }
}

/// Allocated / idle / other / total node counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeCounts {
    pub allocated: u32,
    pub idle: u32,
    pub other: u32,
    pub total: u32,
}

impl NodeCounts {
    /// Parse `"22/0/26/48"`. Anything else yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('/').map(|p| p.parse::<u32>());
        let counts = Self {
            allocated: parts.next()?.ok()?,
            idle: parts.next()?.ok()?,
            other: parts.next()?.ok()?,
            total: parts.next()?.ok()?,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(counts)
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug)]
pub struct SnapshotBuilder {
    state: ClusterState,
    partitions: Vec<PartitionInfo>,
    observed_at: Option<DateTime<Utc>>,
    detail: Option<String>,
}

impl SnapshotBuilder {
    /// Create a new builder for an online snapshot.
    pub fn new() -> Self {
        Self {
            state: ClusterState::Online,
            partitions: Vec::new(),
            observed_at: None,
            detail: None,
        }
    }

    pub fn state(mut self, state: ClusterState) -> Self {
        self.state = state;
        self
    }

    /// Set the observation time (defaults to now).
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a partition built using a closure.
    pub fn partition<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(PartitionInfoBuilder) -> PartitionInfoBuilder,
    {
        let partition = f(PartitionInfoBuilder::new(name)).build();
        self.partitions.push(partition);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            state: self.state,
            partitions: self.partitions,
            observed_at: self.observed_at.unwrap_or_else(Utc::now),
            detail: self.detail,
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a single [`PartitionInfo`].
#[derive(Debug)]
pub struct PartitionInfoBuilder {
    inner: PartitionInfo,
}

impl PartitionInfoBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: PartitionInfo {
                avail: "up".to_string(),
                ..PartitionInfo::new(name)
            },
        }
    }

    pub fn default_partition(mut self) -> Self {
        self.inner.is_default = true;
        self
    }

    pub fn avail(mut self, avail: impl Into<String>) -> Self {
        self.inner.avail = avail.into();
        self
    }

    pub fn timelimit(mut self, timelimit: impl Into<String>) -> Self {
        self.inner.timelimit = timelimit.into();
        self
    }

    pub fn nodes(mut self, nodes: impl Into<String>) -> Self {
        self.inner.nodes = nodes.into();
        self
    }

    pub fn nodelist(mut self, nodelist: impl Into<String>) -> Self {
        self.inner.nodelist = nodelist.into();
        self
    }

    pub fn build(self) -> PartitionInfo {
        self.inner
    }
}
