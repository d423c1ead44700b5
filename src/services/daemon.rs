//! Daemon client - the narrow interface the removal workflow needs from Transmission.
//!
//! [`DaemonClient`] exposes the three queries the workflow uses. [`TransmissionRemote`]
//! implements them by running `transmission-remote`; tests substitute a mock
//! that returns canned output.

use async_trait::async_trait;
use regex::Regex;
use std::io::ErrorKind;
use std::sync::LazyLock;
use thiserror::Error;
use tokio::process::Command;

/// Program used to talk to the daemon
pub const TRANSMISSION_REMOTE: &str = "transmission-remote";

/// Wraps text that must stay a single argument when a command line is tokenized
pub const EXCLUSION_MARKER: char = '•';

/// Marker in a `--remove` response that the daemon accepted the request
pub const SUCCESS_MARKER: &str = "success";

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"•([^•]*)•|\S+").expect("Invalid token regex"));

/// Errors talking to the daemon
///
/// All of these are fatal to the poll cycle. A `--remove` that runs but does not
/// report success is not an error here; the caller inspects the response.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error(
        "Transmission Remove was not able to detect an installed version of {program}. \
         Verify transmission-cli is installed and '{program}' prints usage output"
    )]
    NotInstalled { program: String },

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Queries the removal workflow runs against the daemon
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Identifiers of every torrent the daemon currently holds
    async fn list(&self) -> Result<Vec<String>, DaemonError>;

    /// Raw info block for one torrent
    async fn info(&self, id: &str) -> Result<Vec<String>, DaemonError>;

    /// Ask the daemon to drop a torrent; returns the raw response lines
    async fn remove(&self, id: &str) -> Result<Vec<String>, DaemonError>;
}

/// Split a command line on whitespace, keeping `•...•` spans as one token.
pub fn tokenize_command(command: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(command)
        .filter_map(|caps| match caps.get(1) {
            Some(quoted) => Some(quoted.as_str().to_string()),
            None => caps.get(0).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// Whether a `--remove` response reports success
pub fn removal_confirmed<S: AsRef<str>>(response: &[S]) -> bool {
    response
        .iter()
        .any(|line| line.as_ref().contains(SUCCESS_MARKER))
}

/// Extract torrent identifiers from `--list` output.
///
/// ```text
///     ID   Done       Have  ETA           Up    Down  Ratio  Status       Name
///      1   100%    3.54 GB  Done         0.0     0.0    0.1  Idle         Sample.Torrent
///      7*  100%   10.00 MB  Done         0.0     0.0    2.4  Idle         Other One
/// Sum:             3.55 GB               0.0     0.0
/// ```
///
/// The header and `Sum:` rows are skipped; the `*` error flag is dropped.
pub fn parse_listing<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with("ID") || line.starts_with("Sum:") {
                return None;
            }
            line.split_whitespace()
                .next()
                .map(|id| id.trim_end_matches('*').to_string())
                .filter(|id| !id.is_empty())
        })
        .collect()
}

/// [`DaemonClient`] backed by the `transmission-remote` CLI
#[derive(Debug, Clone)]
pub struct TransmissionRemote {
    program: String,
    server: String,
}

impl TransmissionRemote {
    /// # Arguments
    /// * `server` - Address plus any extra arguments, e.g. `localhost:9091 --auth u:p`
    pub fn new(server: impl Into<String>) -> Self {
        Self::with_program(TRANSMISSION_REMOTE, server)
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(program: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            server: server.into(),
        }
    }

    /// Build the argument list for a query. Identifiers are wrapped in the
    /// exclusion marker so spaces inside them survive tokenizing.
    pub fn build_args(&self, id: Option<&str>, action: &str) -> Vec<String> {
        let command = match id {
            Some(id) => format!(
                "{} --torrent {marker}{}{marker} {}",
                self.server,
                id,
                action,
                marker = EXCLUSION_MARKER
            ),
            None => format!("{} {}", self.server, action),
        };
        tokenize_command(&command)
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<String>, DaemonError> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("Executing: {}", command_line);

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => DaemonError::NotInstalled {
                    program: self.program.clone(),
                },
                _ => DaemonError::Spawn {
                    command: command_line.clone(),
                    source,
                },
            })?;

        if !output.status.success() {
            return Err(DaemonError::CommandFailed {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl DaemonClient for TransmissionRemote {
    async fn list(&self) -> Result<Vec<String>, DaemonError> {
        let lines = self.run(self.build_args(None, "--list")).await?;
        Ok(parse_listing(&lines))
    }

    async fn info(&self, id: &str) -> Result<Vec<String>, DaemonError> {
        self.run(self.build_args(Some(id), "--info")).await
    }

    async fn remove(&self, id: &str) -> Result<Vec<String>, DaemonError> {
        self.run(self.build_args(Some(id), "--remove")).await
    }
}
