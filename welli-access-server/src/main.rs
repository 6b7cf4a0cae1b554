use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use welli_access_server::{config::Config, routes, state::AppState};

const DEFAULT_FILTER: &str = "welli_access_server=debug,welli_access=info,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState::new(&config).await?;
    if state.engine.administrator().is_zero() {
        tracing::warn!("no administrator configured; registry replacement disabled");
    }

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = %config.storage.backend, "welli-access-server listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
