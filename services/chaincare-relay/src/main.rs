use chaincare_core::BUILD_INFO;
use chaincare_relay::{create_app, AppState, RelayArgs, RelayConfig};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RelayConfig::from_args(RelayArgs::parse())?;

    info!("Starting ChainCare Relay {}", BUILD_INFO);

    let state = AppState::from_config(&config).await?;
    info!(
        "Relaying to contract {} as {}",
        state.relay.contract(),
        state.relay.admin_address()
    );

    let app = create_app(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("ChainCare Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
