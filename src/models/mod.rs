//! Data models for the removal agent.
//!
//! - [`RemovalSettings`]: Process-wide settings loaded once from `settings.yaml`
//! - [`EmailSettings`]: SMTP endpoint, credentials and addresses for alerts
//! - [`TorrentRecord`]: One torrent's parsed status, rebuilt every poll cycle
//!
//! Settings are read-only after loading. The driver owns them and lends them to the
//! services by reference; nothing in the services layer mutates configuration.

pub mod settings;
pub mod torrent;

pub use settings::{
    ConnectionSettings, EmailSettings, GeneralSettings, RatioSettings, RemovalSettings,
};
pub use torrent::{FINISHED_STATE, TorrentRecord};
