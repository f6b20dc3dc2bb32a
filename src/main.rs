use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use server::Server;
use store::BetStore;

mod client;
mod config;
mod draw;
mod protocol;
mod server;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // connect tracing to stdout
    tracing_subscriber::fmt::init();

    let config_path = std::env::var("LOTTERY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("lottery.toml"));
    let config = config::load(&config_path)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("termination signal received, finishing up");
        let _ = shutdown_tx.send(true);
    });

    let store = Arc::new(BetStore::new(&config.store_path));
    let server = Server::bind(&config, store, shutdown_rx).await?;
    tracing::info!("server is listening on: {}", server.local_addr()?);

    server.run().await
}

// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install the ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install the SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
