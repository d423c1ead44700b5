use crate::models::RemovalSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat, Map};
use std::fs;
use thiserror::Error;

/// Settings file looked up in the working directory by default
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";

/// Prefix for environment overrides, e.g. `TRANSMISSION_REMOVE__EMAIL__PASSWORD`
pub const ENV_PREFIX: &str = "TRANSMISSION_REMOVE";

/// Top-level sections that must be present
pub const REQUIRED_SECTIONS: [&str; 4] = ["general", "connection", "removal", "email"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "The settings file was not found at {path}. Create it from the sample (--write-sample-config) and apply your settings"
    )]
    NotFound { path: Utf8PathBuf },

    #[error(
        "The {} key(s) are missing from the YAML file. Please verify you have set all required keys and try again",
        .0.join(", ")
    )]
    MissingSections(Vec<String>),

    #[error("Invalid settings in {path}: {source}")]
    Invalid {
        path: Utf8PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Invalid setting '{key}': {reason}")]
    Validation { key: &'static str, reason: String },
}

/// Loads `settings.yaml` with environment overrides layered on top.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings_path: Utf8PathBuf,
    environment: Option<Map<String, String>>,
}

impl ConfigManager {
    /// # Arguments
    /// * `settings_path` - Path to the YAML settings file
    pub fn new<P: AsRef<Utf8Path>>(settings_path: P) -> Self {
        Self {
            settings_path: settings_path.as_ref().to_path_buf(),
            environment: None,
        }
    }

    /// Read overrides from `variables` instead of the process environment.
    pub fn with_environment(mut self, variables: Map<String, String>) -> Self {
        self.environment = Some(variables);
        self
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    /// Load and validate the settings.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if the file does not exist
    /// - [`ConfigError::MissingSections`] naming every absent top-level section
    /// - [`ConfigError::Invalid`] for unreadable YAML or missing/mistyped keys
    /// - [`ConfigError::Validation`] for values outside their allowed range
    pub fn load_settings(&self) -> Result<RemovalSettings, ConfigError> {
        if !self.settings_path.exists() {
            return Err(ConfigError::NotFound {
                path: self.settings_path.clone(),
            });
        }

        let invalid = |source| ConfigError::Invalid {
            path: self.settings_path.clone(),
            source,
        };

        let config = Config::builder()
            .add_source(File::from(self.settings_path.as_std_path()).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.environment.clone()),
            )
            .build()
            .map_err(invalid)?;

        let missing: Vec<String> = REQUIRED_SECTIONS
            .iter()
            .filter(|section| config.get::<config::Value>(section).is_err())
            .map(|section| section.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingSections(missing));
        }

        let settings: RemovalSettings = config.try_deserialize().map_err(invalid)?;
        validate(&settings)?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        tracing::debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    /// Write a sample settings file. Refuses to overwrite an existing file.
    pub fn write_sample(&self) -> Result<()> {
        if self.settings_path.exists() {
            anyhow::bail!(
                "Refusing to overwrite existing settings file: {}",
                self.settings_path
            );
        }

        let yaml_string = serde_yaml_ng::to_string(&RemovalSettings::sample())
            .context("Failed to serialize sample settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write sample settings: {}", self.settings_path))?;

        tracing::info!("Wrote sample settings to {}", self.settings_path);
        Ok(())
    }
}

fn validate(settings: &RemovalSettings) -> Result<(), ConfigError> {
    let ratio = settings.removal.removal_ratio;
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(ConfigError::Validation {
            key: "removal.removal_ratio",
            reason: format!("must be a non-negative number, got {}", ratio),
        });
    }

    if settings.connection.server.trim().is_empty() {
        return Err(ConfigError::Validation {
            key: "connection.server",
            reason: "must not be empty".to_string(),
        });
    }

    if settings.removal.root_download_path.as_str().trim().is_empty() {
        return Err(ConfigError::Validation {
            key: "removal.root_download_path",
            reason: "must not be empty".to_string(),
        });
    }

    Ok(())
}
