//! Turns probe output into a [`Snapshot`].
//!
//! `sinfo --summarize` prints one header line followed by one line per
//! partition:
//!
//! ```text
//! PARTITION AVAIL  TIMELIMIT   NODES(A/I/O/T)  NODELIST
//! batch*       up 3-00:00:00       22/0/26/48  mscluster[11-58]
//! biggpu       up 3-00:00:00          2/1/0/3  mscluster[10,59-60]
//! ```
//!
//! Any successful probe means the cluster is online, even if none of the
//! lines can be read.

use chrono::{DateTime, Utc};
use tracing::debug;

use clusterwatch_types::{PartitionInfo, Snapshot};

use crate::probe::ProbeError;

/// Build a snapshot from raw command output, `None` meaning unreachable.
pub fn parse(raw: Option<&str>, observed_at: DateTime<Utc>) -> Snapshot {
    let Some(text) = raw else {
        return Snapshot::offline(observed_at);
    };

    let partitions: Vec<PartitionInfo> = text.lines().filter_map(parse_line).collect();
    debug!(partitions = partitions.len(), "Parsed status output");
    Snapshot::online(partitions, observed_at)
}

/// [`parse`] a probe result, keeping the failure text on offline snapshots.
pub fn parse_probe(result: &Result<String, ProbeError>, observed_at: DateTime<Utc>) -> Snapshot {
    match result {
        Ok(stdout) => parse(Some(stdout), observed_at),
        Err(err) => parse(None, observed_at).with_detail(err.to_string()),
    }
}

fn parse_line(line: &str) -> Option<PartitionInfo> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    let [name, avail, timelimit, nodes, nodelist] = columns[..] else {
        return None;
    };
    if name == "PARTITION" {
        return None;
    }

    let (name, is_default) = match name.strip_suffix('*') {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };

    Some(PartitionInfo {
        name: name.to_string(),
        is_default,
        avail: avail.to_string(),
        timelimit: timelimit.to_string(),
        nodes: nodes.to_string(),
        nodelist: nodelist.to_string(),
    })
}
