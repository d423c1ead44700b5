// Transmission Remove - removes seeded torrents from a Transmission daemon
//
// This is the library crate containing the removal workflow and its plumbing.
// The binary crate (main.rs) provides the command-line entry point.

pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{EmailSettings, RemovalSettings, TorrentRecord};
pub use services::{Agent, TransmissionRemote};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
