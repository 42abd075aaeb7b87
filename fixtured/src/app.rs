use anyhow::{Context, Result};
use fixtured_api::{AppState, FixtureServer};
use fixtured_core::config::Config;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub async fn run(bind_address: String, config: Config) -> Result<()> {
    if config.occ.enabled {
        info!("occ execution enabled");
    } else {
        warn!("occ execution disabled, /occ requests will be refused");
    }

    let state = AppState::from_config(config).context("failed to prepare host state")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    // Spawn task to handle shutdown signals
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT, shutting down...");
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
                // Dropping the sender would stop the server
                std::future::pending::<()>().await;
            }
        }
    });

    let server = FixtureServer::with_state(bind_address.clone(), state, shutdown_rx);
    server
        .run()
        .await
        .with_context(|| format!("server on {bind_address} failed"))?;

    info!("Server stopped");
    Ok(())
}
