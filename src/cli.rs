use crate::config::DEFAULT_SETTINGS_FILE;
use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "transmission-remove")]
#[command(
    about = "Removes torrents from Transmission and from disk once they reach a seed ratio",
    long_about = None,
    version
)]
pub struct Cli {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
    pub config: Utf8PathBuf,

    /// Directory for the daily rotating log files
    #[arg(long, default_value = "logs")]
    pub log_dir: Utf8PathBuf,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Also log to the console
    #[arg(long)]
    pub console: bool,

    /// Run a single remove check and exit
    #[arg(long)]
    pub once: bool,

    /// Write a sample settings file to the --config path and exit
    #[arg(long)]
    pub write_sample_config: bool,
}
