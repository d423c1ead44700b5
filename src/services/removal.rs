//! Two-phase torrent removal.
//!
//! A qualifying torrent is removed from the daemon first, then its content is
//! deleted from disk. Each phase is verified after a settle delay. The pipeline only
//! moves forward: a failed step is alerted and logged, never rolled back, and the
//! next step still runs.
//!
//! Expected failures (daemon did not confirm, path missing, path still present) come
//! back as [`RemovalAnomaly`] values inside the [`RemovalOutcome`]. Only unexpected
//! conditions such as the daemon command failing or a filesystem permission error
//! are returned as [`RemovalError`].

use crate::models::{RemovalSettings, TorrentRecord};
use crate::services::alerts::{
    Alert, AlertChannel, SUBJECT_FOLDER_REMOVAL_FAILED, SUBJECT_REMOVAL_FAILED,
    SUBJECT_TORRENT_MISSING, send_or_log,
};
use crate::services::daemon::{DaemonClient, DaemonError, removal_confirmed};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;

/// Wait between a mutation and the read that verifies it
pub const SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Something that went wrong during a removal but does not stop the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalAnomaly {
    /// The `--remove` response did not contain the success marker
    DaemonRemovalUnconfirmed { response: Vec<String> },

    /// The daemon still lists the torrent after the settle delay
    StillListed { id: String },

    /// Nothing was on disk to delete
    PathMissing { path: Utf8PathBuf },

    /// The content is still on disk after deletion and the settle delay
    PathStillPresent { path: Utf8PathBuf },
}

impl RemovalAnomaly {
    /// Informational anomalies need no operator action.
    pub fn is_informational(&self) -> bool {
        matches!(self, RemovalAnomaly::PathMissing { .. })
    }

    pub fn alert(&self, name: &str) -> Alert {
        match self {
            RemovalAnomaly::DaemonRemovalUnconfirmed { response } => Alert::new(
                SUBJECT_REMOVAL_FAILED,
                format!(
                    "Transmission did not return a successful response during the torrent ({}) removal.\n\nResponse = {:?}",
                    name, response
                ),
            ),
            RemovalAnomaly::StillListed { id } => Alert::new(
                SUBJECT_REMOVAL_FAILED,
                format!(
                    "The torrent ({}) with ID {} was not removed from Transmission successfully. Manual intervention is required.",
                    name, id
                ),
            ),
            RemovalAnomaly::PathMissing { path } => Alert::new(
                SUBJECT_TORRENT_MISSING,
                format!(
                    "The torrent ({}) path ({}) did not exist. No removal required",
                    name, path
                ),
            ),
            RemovalAnomaly::PathStillPresent { path } => Alert::new(
                SUBJECT_FOLDER_REMOVAL_FAILED,
                format!(
                    "The torrent ({}) folder was not removed from the directory ({}) successfully. Manual intervention is required.",
                    name, path
                ),
            ),
        }
    }
}

/// What happened to the torrent's content on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilesOutcome {
    Deleted,
    Missing,
    StillPresent,
}

/// Result of one removal
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalOutcome {
    pub path: Utf8PathBuf,
    /// The daemon's response contained the success marker
    pub daemon_confirmed: bool,
    /// The torrent no longer appears in the daemon's listing
    pub daemon_verified: bool,
    pub files: FilesOutcome,
    pub anomalies: Vec<RemovalAnomaly>,
}

impl RemovalOutcome {
    /// No anomaly that needs an operator
    pub fn is_clean(&self) -> bool {
        self.anomalies.iter().all(RemovalAnomaly::is_informational)
    }
}

/// Unexpected failures that abort the poll cycle
#[derive(Error, Debug)]
pub enum RemovalError {
    #[error(transparent)]
    Daemon(#[from] DaemonError),

    #[error(
        "Refusing to delete torrent ({name}): location '{stop_location}' does not resolve below the download root"
    )]
    UnsafePath { name: String, stop_location: String },

    #[error("Filesystem operation on {path} failed: {source}")]
    Filesystem {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether anything (file, directory or symlink) exists at `path`.
pub async fn path_exists(path: &Utf8Path) -> Result<bool, RemovalError> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(RemovalError::Filesystem {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn delete_path(path: &Utf8Path) -> Result<(), RemovalError> {
    let to_fs_error = |source: std::io::Error| RemovalError::Filesystem {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(to_fs_error)?;

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await.map_err(to_fs_error)
    } else {
        tokio::fs::remove_file(path).await.map_err(to_fs_error)
    }
}

/// Runs the removal pipeline for qualifying torrents
pub struct RemovalExecutor<'a, D: ?Sized, A: ?Sized> {
    daemon: &'a D,
    alerts: &'a A,
    settings: &'a RemovalSettings,
    settle_delay: Duration,
}

impl<'a, D, A> RemovalExecutor<'a, D, A>
where
    D: DaemonClient + ?Sized,
    A: AlertChannel + ?Sized,
{
    pub fn new(daemon: &'a D, alerts: &'a A, settings: &'a RemovalSettings) -> Self {
        Self {
            daemon,
            alerts,
            settings,
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Override the settle delay. The settings file does not expose this.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Remove one torrent from the daemon and from disk.
    ///
    /// # Errors
    ///
    /// - [`RemovalError::UnsafePath`] before anything is touched if the torrent's
    ///   location would escape the download root
    /// - [`RemovalError::Daemon`] if a daemon command cannot be run
    /// - [`RemovalError::Filesystem`] if checking or deleting the path fails
    pub async fn execute(
        &self,
        id: &str,
        record: &TorrentRecord,
    ) -> Result<RemovalOutcome, RemovalError> {
        let name = record.name.as_str();
        let path = record
            .resolved_path(self.settings.root_download_path())
            .ok_or_else(|| RemovalError::UnsafePath {
                name: record.name.clone(),
                stop_location: record.stop_location.clone(),
            })?;

        tracing::info!(
            "The torrent ({}) has reached its share ratio of {} (ratio {}, state {}). Removing torrent from Transmission and the directory",
            name,
            self.settings.removal_ratio(),
            record.ratio,
            record.state
        );

        let mut anomalies = Vec::new();

        // Daemon side
        let response = self.daemon.remove(id).await?;
        let daemon_confirmed = removal_confirmed(&response);
        if daemon_confirmed {
            tracing::debug!(
                "Transmission returned a successful response during the torrent ({}) removal",
                name
            );
        } else {
            tracing::error!(
                "The torrent ({}) was not removed from Transmission successfully: {:?}",
                name,
                response
            );
            self.report(
                &mut anomalies,
                name,
                RemovalAnomaly::DaemonRemovalUnconfirmed { response },
            )
            .await;
        }

        tokio::time::sleep(self.settle_delay).await;

        let still_listed = self.daemon.list().await?.iter().any(|listed| listed == id);
        if still_listed {
            tracing::error!(
                "The torrent ({}) is still listed by Transmission after removal",
                name
            );
            self.report(
                &mut anomalies,
                name,
                RemovalAnomaly::StillListed { id: id.to_string() },
            )
            .await;
        } else {
            tracing::info!("The torrent ({}) removed from Transmission successfully", name);
        }

        // Filesystem side
        tracing::debug!("Removing torrent from complete path: {}", path);
        let files = if path_exists(&path).await? {
            tracing::debug!("The torrent path ({}) exists. Removing the torrent folder", path);
            delete_path(&path).await?;

            tokio::time::sleep(self.settle_delay).await;

            tracing::debug!("Verifying the torrent folder was removed");
            if path_exists(&path).await? {
                tracing::error!(
                    "The torrent path ({}) still exists. Removing the torrent folder failed",
                    path
                );
                self.report(
                    &mut anomalies,
                    name,
                    RemovalAnomaly::PathStillPresent { path: path.clone() },
                )
                .await;
                FilesOutcome::StillPresent
            } else {
                tracing::info!("The torrent path ({}) removed successfully", path);
                FilesOutcome::Deleted
            }
        } else {
            tracing::warn!(
                "The torrent path ({}) does not exist. No removal required",
                path
            );
            self.report(
                &mut anomalies,
                name,
                RemovalAnomaly::PathMissing { path: path.clone() },
            )
            .await;
            FilesOutcome::Missing
        };

        Ok(RemovalOutcome {
            path,
            daemon_confirmed,
            daemon_verified: !still_listed,
            files,
            anomalies,
        })
    }

    async fn report(
        &self,
        anomalies: &mut Vec<RemovalAnomaly>,
        name: &str,
        anomaly: RemovalAnomaly,
    ) {
        send_or_log(self.alerts, &anomaly.alert(name)).await;
        anomalies.push(anomaly);
    }
}
