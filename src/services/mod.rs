//! Services module - the removal workflow.
//!
//! Everything here is framework-agnostic: no CLI, no logging setup, no config
//! loading. Settings are passed in explicitly, and the two outside collaborators
//! (the torrent daemon and the alert channel) sit behind traits so the workflow can
//! be exercised with canned daemon output.
//!
//! # Components
//!
//! - [`status_parser`]: Turns a `transmission-remote --info` block into a
//!   [`TorrentRecord`](crate::models::TorrentRecord), insisting on exactly one line
//!   per field
//! - [`policy`]: Decides whether a torrent is done seeding
//! - [`removal`]: Removes a torrent from the daemon, then from disk, verifying each
//!   phase after a settle delay
//! - [`cycle`]: Drives one poll cycle over the daemon's torrents, plus the run loop
//! - [`daemon`]: The [`DaemonClient`] seam and its `transmission-remote` implementation
//! - [`alerts`]: The [`AlertChannel`] seam with email and log-only implementations
//!
//! # Flow
//!
//! 1. `list` the daemon's torrent identifiers
//! 2. For each identifier, fetch `info` and parse it (empty output is skipped)
//! 3. If the ratio reached the threshold or the torrent is `Finished`, run the
//!    removal pipeline
//! 4. Anomalies are alerted and the cycle moves on; fatal errors end the cycle

pub mod alerts;
pub mod cycle;
pub mod daemon;
pub mod policy;
pub mod removal;
pub mod status_parser;

pub use alerts::{Alert, AlertChannel, AlertError, EmailAlerter, LogAlerter};
pub use cycle::{Agent, CycleError, CycleReport, RemovedTorrent};
pub use daemon::{DaemonClient, DaemonError, TransmissionRemote};
pub use policy::should_remove;
pub use removal::{
    FilesOutcome, RemovalAnomaly, RemovalError, RemovalExecutor, RemovalOutcome, path_exists,
};
pub use status_parser::{Field, FieldMismatch, ParseError, parse_torrent_info};
