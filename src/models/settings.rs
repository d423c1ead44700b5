use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings from settings.yaml
///
/// Every section is required. Built once at startup by
/// [`ConfigManager`](crate::config::ConfigManager) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalSettings {
    pub general: GeneralSettings,
    pub connection: ConnectionSettings,
    pub removal: RatioSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Seconds to sleep between poll cycles
    pub remove_sleep: u64,

    /// Email removal anomalies (missing path, unconfirmed removal, ...)
    pub email_alerts: bool,

    /// Email fatal cycle errors
    pub alert_program_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Daemon address plus any extra transmission-remote arguments,
    /// e.g. `localhost:9091 --auth user:pass`
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSettings {
    /// Ratio at or above which a torrent is removed
    pub removal_ratio: f64,

    /// Root that the daemon's reported locations are relative to
    pub root_download_path: Utf8PathBuf,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    /// SMTP server, either `host` or `host:port`
    pub smtp: String,
    pub authentication_required: bool,
    pub use_tls: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    pub to_email: String,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp", &self.smtp)
            .field("authentication_required", &self.authentication_required)
            .field("use_tls", &self.use_tls)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .finish()
    }
}

impl EmailSettings {
    /// Split `smtp` into host and port.
    ///
    /// Without an explicit port, 587 is used for TLS and 25 otherwise.
    pub fn endpoint(&self) -> (&str, u16) {
        let default_port = if self.use_tls { 587 } else { 25 };
        match self.smtp.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host, port),
                Err(_) => (self.smtp.as_str(), default_port),
            },
            None => (self.smtp.as_str(), default_port),
        }
    }
}

impl RemovalSettings {
    pub fn removal_ratio(&self) -> f64 {
        self.removal.removal_ratio
    }

    pub fn server(&self) -> &str {
        &self.connection.server
    }

    pub fn root_download_path(&self) -> &camino::Utf8Path {
        &self.removal.root_download_path
    }

    /// Settings used by `--write-sample-config`.
    pub fn sample() -> Self {
        Self {
            general: GeneralSettings {
                remove_sleep: 300,
                email_alerts: true,
                alert_program_errors: true,
            },
            connection: ConnectionSettings {
                server: "localhost:9091 --auth transmission:transmission".to_string(),
            },
            removal: RatioSettings {
                removal_ratio: 2.0,
                root_download_path: Utf8PathBuf::from("/downloads"),
            },
            email: EmailSettings {
                smtp: "smtp.example.com:587".to_string(),
                authentication_required: true,
                use_tls: true,
                username: "alerts@example.com".to_string(),
                password: "change-me".to_string(),
                from_email: "alerts@example.com".to_string(),
                to_email: "admin@example.com".to_string(),
            },
        }
    }
}
