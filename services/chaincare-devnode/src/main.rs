use admin_signer::Credential;
use anyhow::Context;
use chaincare_core::{Address, Wei, BUILD_INFO};
use chaincare_devnode::create_app;
use clap::Parser;
use policy_ledger::{InMemoryLedger, DEFAULT_GAS_PRICE};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chaincare-devnode")]
#[command(about = "ChainCare Devnode - in-memory policy ledger for development")]
#[command(version = chaincare_core::VERSION)]
struct Args {
    #[arg(long, env = "DEVNODE_PORT", default_value_t = 7545)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Contract admin address
    #[arg(long, env = "ADMIN_ADDRESS", conflicts_with = "admin_private_key")]
    admin_address: Option<Address>,

    /// Derive the contract admin from this key instead
    #[arg(long, env = "ADMIN_PRIVATE_KEY", hide_env_values = true)]
    admin_private_key: Option<String>,

    /// Minimum gas price in wei
    #[arg(long, default_value_t = DEFAULT_GAS_PRICE)]
    gas_price: Wei,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let admin = match (args.admin_address, args.admin_private_key) {
        (Some(address), _) => address,
        (None, Some(key)) => Credential::from_hex(&key)?.address(),
        (None, None) => anyhow::bail!("either --admin-address or --admin-private-key is required"),
    };

    info!("Starting ChainCare Devnode {}", BUILD_INFO);

    let ledger = InMemoryLedger::with_gas_price(admin, args.gas_price);
    info!(
        "Policy registry at {} administered by {}",
        ledger.contract_info().address,
        admin
    );

    let app = create_app(ledger);

    let listener = TcpListener::bind((args.bind.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.bind, args.port))?;
    info!("ChainCare Devnode listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
