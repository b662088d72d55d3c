//! Deciding what to write.
//!
//! Compares the freshly observed [`Snapshot`] with the recovered prior
//! notification. A state change (or no prior at all) starts a new message so
//! the transition shows up as a channel notification; an unchanged state
//! refreshes the existing message in place.

use std::fmt;

use chrono::TimeDelta;

use clusterwatch_types::{format_elapsed, ClusterState, Notification, PartitionInfo, Snapshot};

use crate::config::DisplayConfig;

/// What the notifier should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Post a fresh message announcing a (possibly new) state.
    PostNew { state: ClusterState, body: String },
    /// Rewrite the existing message; the state has not changed.
    UpdateInPlace {
        message_id: String,
        state: ClusterState,
        body: String,
    },
}

/// [`Action`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    PostNew,
    UpdateInPlace,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::PostNew => write!(f, "post_new"),
            ActionKind::UpdateInPlace => write!(f, "update_in_place"),
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::PostNew { .. } => ActionKind::PostNew,
            Action::UpdateInPlace { .. } => ActionKind::UpdateInPlace,
        }
    }

    pub fn state(&self) -> ClusterState {
        match self {
            Action::PostNew { state, .. } | Action::UpdateInPlace { state, .. } => *state,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Action::PostNew { body, .. } | Action::UpdateInPlace { body, .. } => body,
        }
    }
}

/// Choose between posting and updating, and render the message body.
pub fn decide(snapshot: &Snapshot, prior: Option<&Notification>, display: &DisplayConfig) -> Action {
    match prior {
        Some(prior) if prior.state == snapshot.state => {
            let elapsed = snapshot.observed_at - prior.created_at;
            Action::UpdateInPlace {
                message_id: prior.message_id.clone(),
                state: snapshot.state,
                body: render_body(snapshot, elapsed, display),
            }
        }
        _ => Action::PostNew {
            state: snapshot.state,
            body: render_body(snapshot, TimeDelta::zero(), display),
        },
    }
}

/// Render a status message.
///
/// ~~~text
/// 🌞  **ONLINE**  |  Duration: **3h 10m**  [2024/03/01 11:00:00 _SAST_]
/// ```yaml
/// batch*: 0|22|26|48  # up 3-00:00:00
/// biggpu: 1|2|0|3     # up 3-00:00:00
/// ```
/// ~~~
///
/// The marker symbol always comes first; it is how the state is read back.
pub fn render_body(snapshot: &Snapshot, elapsed: TimeDelta, display: &DisplayConfig) -> String {
    let state = snapshot.state;
    let local = snapshot.observed_at.with_timezone(&display.timezone);

    let mut body = format!(
        "{}  **{}**  |  Duration: **{}**  [{} _{}_]",
        display.markers.for_state(state),
        state.label(),
        format_elapsed(elapsed),
        local.format("%Y/%m/%d %H:%M:%S"),
        local.format("%Z"),
    );

    if !state.is_online() {
        if let Some(detail) = snapshot.detail.as_deref().filter(|d| !d.is_empty()) {
            body.push_str(&format!("  |  *{}*", detail));
        }
    }

    if display.append_info && !snapshot.partitions.is_empty() {
        body.push_str("\n```yaml\n");
        body.push_str(&partition_table(&snapshot.partitions));
        body.push_str("```");
    }

    body
}

// One line per partition, counts in idle|alloc|other|total order.
fn partition_table(partitions: &[PartitionInfo]) -> String {
    let rows: Vec<(String, String, String)> = partitions
        .iter()
        .map(|p| {
            let name = format!("{}{}:", p.name, if p.is_default { "*" } else { "" });
            let counts = match p.node_counts() {
                Some(c) => format!("{}|{}|{}|{}", c.idle, c.allocated, c.other, c.total),
                None => p.nodes.clone(),
            };
            let note = format!("{} {}", p.avail, p.timelimit);
            (name, counts, note)
        })
        .collect();

    let name_width = rows.iter().map(|r| r.0.chars().count()).max().unwrap_or(0);
    let counts_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);

    rows.iter()
        .map(|(name, counts, note)| {
            format!(
                "{:<nw$} {:<cw$}  # {}\n",
                name,
                counts,
                note,
                nw = name_width,
                cw = counts_width
            )
        })
        .collect()
}
