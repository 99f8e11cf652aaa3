use crate::compressor::Compressor;
use crate::config::{load_config, Config, ConfigError};
use crate::coord::Coordinator;
use crate::rotator::Rotator;
use crate::stream::{StreamId, StreamRegistry};
use crate::watcher::{self, WatchError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let config = match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "loading configuration");
            load_config(&path)?
        }
        None => {
            info!("no config file found, running with defaults");
            Config::default()
        }
    };

    run_daemon(config).await
}

async fn run_daemon(config: Config) -> Result<(), RunError> {
    info!(
        watch_dir = %config.watch_dir.display(),
        max_generations = config.max_generations,
        streams = ?config.streams,
        "starting rotation daemon"
    );

    let registry = Arc::new(StreamRegistry::new(config.streams.clone()));
    let coord = Arc::new(Coordinator::new(registry.len()));

    let (event_tx, event_rx) = mpsc::channel::<String>(config.events.buffer_limit);
    let (compress_tx, compress_rx) = mpsc::channel::<StreamId>(registry.len() * 2);

    // Subscribe before spawning the workers so a failed subscription
    // prevents startup (and yields a non-zero exit).
    let dir_watcher = watcher::watch_dir(&config.watch_dir, event_tx)?;
    info!(watch_dir = %config.watch_dir.display(), "watching for sealed segments");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (rotator_ready_tx, rotator_ready_rx) = oneshot::channel();
    let (compressor_ready_tx, compressor_ready_rx) = oneshot::channel();

    let rotator = Rotator::new(
        config.watch_dir.clone(),
        config.max_generations,
        Arc::clone(&registry),
        Arc::clone(&coord),
        compress_tx,
    );
    let rotator_handle =
        tokio::spawn(rotator.run(event_rx, shutdown_rx.clone(), rotator_ready_tx));

    let compressor = Compressor::new(
        config.watch_dir.clone(),
        config.max_generations,
        Arc::clone(&registry),
        Arc::clone(&coord),
        config.archive.clone(),
    );
    let compressor_handle =
        tokio::spawn(compressor.run(compress_rx, shutdown_rx.clone(), compressor_ready_tx));

    // Do not report the daemon up until both workers have entered their
    // loops.
    if rotator_ready_rx.await.is_err() {
        warn!("rotator exited before signaling readiness");
    }
    if compressor_ready_rx.await.is_err() {
        warn!("compressor exited before signaling readiness");
    }

    info!("daemon started, press Ctrl+C to shutdown");

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
    }

    let _ = shutdown_tx.send(true);
    // Dropping the subscription closes the event channel, releasing the
    // rotator from its read suspension point.
    drop(dir_watcher);

    match tokio::time::timeout(std::time::Duration::from_secs(5), rotator_handle).await {
        Ok(Ok(())) => info!("rotator stopped gracefully"),
        Ok(Err(e)) => error!(error = %e, "rotator join error"),
        Err(_) => warn!("rotator shutdown timed out after 5 seconds"),
    }

    match tokio::time::timeout(std::time::Duration::from_secs(30), compressor_handle).await {
        Ok(Ok(())) => info!("compressor stopped gracefully"),
        Ok(Err(e)) => error!(error = %e, "compressor join error"),
        Err(_) => warn!("compressor shutdown timed out after 30 seconds"),
    }

    info!("daemon shutdown complete");

    Ok(())
}
