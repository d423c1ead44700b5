//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use mockall::mock;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use transmission_remove::RemovalSettings;
use transmission_remove::services::{Alert, AlertChannel, AlertError, DaemonClient, DaemonError};

pub const SUCCESS_RESPONSE: &str = r#"localhost:9091/transmission/rpc/ responded: "success""#;

mock! {
    pub Daemon {}

    #[async_trait]
    impl DaemonClient for Daemon {
        async fn list(&self) -> Result<Vec<String>, DaemonError>;
        async fn info(&self, id: &str) -> Result<Vec<String>, DaemonError>;
        async fn remove(&self, id: &str) -> Result<Vec<String>, DaemonError>;
    }
}

/// Alert channel that keeps every alert it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingAlerter {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlerter {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.subject).collect()
    }
}

#[async_trait]
impl AlertChannel for RecordingAlerter {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Info block as printed by `transmission-remote --info`
pub fn info_block(name: &str, ratio: &str, location: &str, state: &str) -> Vec<String> {
    vec![
        "NAME".to_string(),
        "  Id: 149".to_string(),
        format!("  Name: {}", name),
        "  Hash: fc298a353253232532541e3ba5adbec712f".to_string(),
        String::new(),
        "TRANSFER".to_string(),
        format!("  State: {}", state),
        format!("  Location: {}", location),
        "  Percent Done: 100%".to_string(),
        "  ETA: 0 seconds (0 seconds)".to_string(),
        "  Uploaded: 497.8 MB".to_string(),
        format!("  Ratio: {}", ratio),
        String::new(),
        "LIMITS & BANDWIDTH".to_string(),
        "  Ratio Limit: Default".to_string(),
        "  Peer limit: 50".to_string(),
    ]
}

pub fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

pub fn settings_with_root(root: &Utf8Path, removal_ratio: f64) -> RemovalSettings {
    let mut settings = RemovalSettings::sample();
    settings.removal.root_download_path = root.to_path_buf();
    settings.removal.removal_ratio = removal_ratio;
    settings
}
