//! # clusterwatch-types
//!
//! Core types shared by the clusterwatch crates. This crate defines what a
//! single probe of a compute cluster looks like, how the reported state is
//! encoded in a chat message, and the read/write views of those messages.
//!
//! ## Design Goals
//!
//! - **No I/O**: everything here is plain data and pure functions
//! - **Optional serialization**: enable the `serde` feature as needed
//! - **Channel is the store**: the only persisted state is a marker symbol
//!   embedded in the latest status message, see [`MarkerSet`]
//!
//! ## Example
//!
//! ```rust
//! use clusterwatch_types::{ClusterState, MarkerSet, Snapshot};
//!
//! let snapshot = Snapshot::builder()
//!     .state(ClusterState::Online)
//!     .partition("batch", |p| p.default_partition().nodes("22/0/26/48"))
//!     .build();
//!
//! assert!(snapshot.is_online());
//!
//! let markers = MarkerSet::new("🌞", "⛈");
//! assert_eq!(markers.classify("🌞  **ONLINE**"), Some(ClusterState::Online));
//! ```

mod elapsed;
mod marker;
mod message;
mod snapshot;
mod state;

pub use elapsed::*;
pub use marker::*;
pub use message::*;
pub use snapshot::*;
pub use state::*;
