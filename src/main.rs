//! Transmission Remove - removes seeded torrents from Transmission.
//!
//! Main entry point for the command-line agent.
//!
//! # Execution Flow
//!
//! 1. Parse the command line
//! 2. Initialize logging → logs/transmission-remove.<date>
//! 3. Load settings.yaml (plus `TRANSMISSION_REMOVE__*` environment overrides)
//! 4. Create a single-threaded tokio runtime
//! 5. Run remove checks until Ctrl-C (or once with `--once`)
//!
//! # Requirements
//!
//! `transmission-remote` (from transmission-cli) must be on the PATH.

use anyhow::Result;
use clap::Parser;
use transmission_remove::cli::Cli;
use transmission_remove::{APP_NAME, Agent, ConfigManager, TransmissionRemote, VERSION};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_manager = ConfigManager::new(&cli.config);

    if cli.write_sample_config {
        config_manager.write_sample()?;
        println!("Sample settings written to {}", cli.config);
        return Ok(());
    }

    // Held until exit so buffered log lines are flushed
    let _guard = transmission_remove::logging::setup_logging(&cli.log_dir, cli.debug, cli.console)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Configuration problems are fatal before the first poll cycle
    let settings = config_manager.load_settings().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    // Torrents are processed strictly one at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let daemon = TransmissionRemote::new(settings.server());
    let agent = Agent::new(daemon, settings);

    let result = runtime.block_on(async {
        if cli.once {
            agent.run_once().await.map(|_| ())
        } else {
            // Spawned so the handler is installed before the first cycle yields;
            // a Ctrl-C mid-cycle is then held until the cycle finishes
            let ctrl_c = tokio::spawn(tokio::signal::ctrl_c());
            agent
                .run_forever(async {
                    match ctrl_c.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::error!("Failed to listen for Ctrl-C: {}", e);
                            std::future::pending::<()>().await;
                        }
                        Err(e) => {
                            tracing::error!("Ctrl-C listener task failed: {}", e);
                            std::future::pending::<()>().await;
                        }
                    }
                })
                .await;
            Ok(())
        }
    });

    agent.metrics().log_summary();
    tracing::info!("Application shutdown complete");

    result
}
