use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lib_dictionary::configs::load_config;
use lib_dictionary::loggers::setup_logging;
use lib_dictionary::Dictionary;
use tokio::signal;

mod dictionary_logic;
use dictionary_logic::{console, snapshotter};

const APP_NAME: &str = "server_dictionary";

async fn terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        // On non-unix platforms, just wait forever.
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    let log_level = config.log_level.as_deref().unwrap_or("info");
    setup_logging(APP_NAME, config.log_dir.as_deref(), log_level)?;

    let dictionary = Arc::new(Dictionary::new(config.to_options())?);
    if let Some(path) = &config.snapshot_path {
        snapshotter::restore(&dictionary, path);
    }

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let snapshot_handle = match (&config.snapshot_path, config.snapshot_interval_secs) {
        (Some(path), Some(secs)) if secs > 0 => Some(tokio::spawn(snapshotter::run(
            Arc::clone(&dictionary),
            path.clone(),
            Duration::from_secs(secs),
            shutdown_tx.subscribe(),
        ))),
        _ => None,
    };

    let mut console_handle = tokio::spawn(console::run(Arc::clone(&dictionary), shutdown_tx.subscribe()));

    // Wait for a shutdown signal or the end of input
    let console_finished = tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
            false
        }
        _ = terminate() => false,
        res = &mut console_handle => {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("Console failed: {}", e),
                Err(e) => log::error!("Console task panicked: {}", e),
            }
            true
        }
    };

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    if !console_finished {
        let _ = console_handle.await;
    }
    if let Some(handle) = snapshot_handle {
        let _ = handle.await;
    }

    dictionary.shutdown().await?;
    if let Some(path) = &config.snapshot_path {
        snapshotter::save(&dictionary, path);
    }

    log::info!("Shutdown complete.");
    Ok(())
}
