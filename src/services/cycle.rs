//! Poll cycle driver.
//!
//! One cycle takes a snapshot of the daemon's torrent list and processes each
//! torrent in order: fetch its info, parse it, decide, remove. Torrents added while
//! the cycle runs are picked up by the next one. A fatal error aborts the cycle and
//! the run loop starts over from a fresh listing after a short pause.

use crate::metrics::Metrics;
use crate::models::RemovalSettings;
use crate::services::alerts::{Alert, AlertChannel, EmailAlerter, LogAlerter, send_or_log};
use crate::services::daemon::{DaemonClient, DaemonError};
use crate::services::policy::should_remove;
use crate::services::removal::{RemovalError, RemovalExecutor, RemovalOutcome, SETTLE_DELAY};
use crate::services::status_parser::{ParseError, parse_torrent_info};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Pause before retrying after a failed cycle
pub const ERROR_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Errors that abort a poll cycle
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Listing torrents failed")]
    List(#[source] DaemonError),

    #[error("Fetching info for torrent {id} failed")]
    Info {
        id: String,
        #[source]
        source: DaemonError,
    },

    #[error("Info for torrent {id} could not be parsed")]
    Parse {
        id: String,
        #[source]
        source: ParseError,
    },

    #[error("Removing torrent {id} failed")]
    Removal {
        id: String,
        #[source]
        source: RemovalError,
    },
}

/// A torrent that went through the removal pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedTorrent {
    pub id: String,
    pub name: String,
    pub outcome: RemovalOutcome,
}

/// What one poll cycle did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Torrents whose info was parsed
    pub inspected: usize,
    /// Torrents the daemon returned no info for
    pub skipped: usize,
    /// Torrents below the threshold and not finished
    pub kept: usize,
    pub removed: Vec<RemovedTorrent>,
}

/// The long-running removal agent
pub struct Agent<D> {
    daemon: D,
    settings: RemovalSettings,
    removal_alerts: Box<dyn AlertChannel>,
    error_alerts: Option<Box<dyn AlertChannel>>,
    metrics: Metrics,
    settle_delay: Duration,
}

impl<D: DaemonClient> Agent<D> {
    /// Build an agent whose alert channels follow the `general` settings:
    /// removal anomalies are emailed when `email_alerts` is set and only logged
    /// otherwise; fatal errors are emailed when `alert_program_errors` is set.
    pub fn new(daemon: D, settings: RemovalSettings) -> Self {
        let removal_alerts: Box<dyn AlertChannel> = if settings.general.email_alerts {
            Box::new(EmailAlerter::new(settings.email.clone()))
        } else {
            Box::new(LogAlerter)
        };
        let error_alerts = settings
            .general
            .alert_program_errors
            .then(|| Box::new(EmailAlerter::new(settings.email.clone())) as Box<dyn AlertChannel>);

        Self::with_alert_channels(daemon, settings, removal_alerts, error_alerts)
    }

    pub fn with_alert_channels(
        daemon: D,
        settings: RemovalSettings,
        removal_alerts: Box<dyn AlertChannel>,
        error_alerts: Option<Box<dyn AlertChannel>>,
    ) -> Self {
        Self {
            daemon,
            settings,
            removal_alerts,
            error_alerts,
            metrics: Metrics::new(),
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn settings(&self) -> &RemovalSettings {
        &self.settings
    }

    /// Run one poll cycle over a snapshot of the daemon's torrents.
    ///
    /// # Errors
    ///
    /// Any [`CycleError`]. A parse failure is fatal for the whole cycle since it
    /// means the daemon's output format no longer matches what the parser expects.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let ids = self.daemon.list().await.map_err(CycleError::List)?;
        tracing::debug!("Transmission listed {} torrents", ids.len());

        let mut report = CycleReport::default();

        for id in &ids {
            let lines = self
                .daemon
                .info(id)
                .await
                .map_err(|source| CycleError::Info {
                    id: id.clone(),
                    source,
                })?;

            let parsed = parse_torrent_info(&lines).map_err(|source| CycleError::Parse {
                id: id.clone(),
                source,
            })?;

            let Some(record) = parsed else {
                tracing::debug!("No usable torrent info provided for {}. Skipping this entry", id);
                self.metrics.record_torrent_skipped();
                report.skipped += 1;
                continue;
            };

            self.metrics.record_torrent_inspected();
            report.inspected += 1;

            if !should_remove(&record, self.settings.removal_ratio()) {
                tracing::debug!(
                    "The torrent ({}) has a ratio of {} and is {}. Keeping it",
                    record.name,
                    record.ratio,
                    record.state
                );
                report.kept += 1;
                continue;
            }

            let start = Instant::now();
            let outcome = RemovalExecutor::new(
                &self.daemon,
                self.removal_alerts.as_ref(),
                &self.settings,
            )
            .with_settle_delay(self.settle_delay)
            .execute(id, &record)
            .await
            .map_err(|source| CycleError::Removal {
                id: id.clone(),
                source,
            })?;

            self.metrics.record_torrent_removed(start.elapsed());
            self.metrics.record_anomalies(outcome.anomalies.len());

            report.removed.push(RemovedTorrent {
                id: id.clone(),
                name: record.name,
                outcome,
            });
        }

        Ok(report)
    }

    /// Run one cycle, alerting and logging if it fails.
    pub async fn run_once(&self) -> anyhow::Result<CycleReport> {
        match self.run_cycle().await {
            Ok(report) => {
                self.metrics.record_cycle_completed();
                tracing::info!(
                    "Remove check complete: {} inspected, {} skipped, {} kept, {} removed",
                    report.inspected,
                    report.skipped,
                    report.kept,
                    report.removed.len()
                );
                self.metrics.log_periodic();
                Ok(report)
            }
            Err(e) => {
                self.metrics.record_cycle_failed();
                let error = anyhow::Error::new(e).context("Transmission Remove poll cycle failed");
                tracing::error!("{:#}", error);

                if let Some(channel) = &self.error_alerts {
                    send_or_log(channel.as_ref(), &Alert::program_error(&error)).await;
                }

                Err(error)
            }
        }
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Sleeps `remove_sleep` seconds after a successful cycle and
    /// [`ERROR_RETRY_DELAY`] after a failed one. Shutdown is only observed while
    /// sleeping between cycles; a cycle in progress always runs to completion so a
    /// torrent is never dropped from the daemon with its content left on disk.
    pub async fn run_forever<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let remove_sleep = Duration::from_secs(self.settings.general.remove_sleep);

        loop {
            let result = self.run_once().await;

            let pause = match result {
                Ok(_) => {
                    tracing::debug!(
                        "{} seconds until next torrent remove check",
                        remove_sleep.as_secs()
                    );
                    remove_sleep
                }
                Err(_) => ERROR_RETRY_DELAY,
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Shutdown requested, stopping remove checks");
    }
}
