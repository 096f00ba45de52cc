//! Relay configuration
//!
//! Everything identity-related is required up front: the relay refuses to
//! start without a contract address, an admin key and a token secret.

use admin_signer::Credential;
use chaincare_core::{Address, ChaincareError, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "chaincare-relay")]
#[command(about = "ChainCare Relay - administrative transaction relay")]
#[command(version = chaincare_core::VERSION)]
pub struct RelayArgs {
    /// Address to bind the HTTP listener on
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Ledger node base URL
    #[arg(long, env = "WEB3_PROVIDER", default_value = "http://127.0.0.1:7545")]
    pub ledger_url: String,

    #[arg(long, env = "POLICY_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    #[arg(long, env = "ADMIN_PRIVATE_KEY", hide_env_values = true)]
    pub admin_private_key: Option<String>,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Username treated as the administrator
    #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Seed an admin account bound to the admin signing address
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    /// Run an in-process development ledger instead of connecting to one
    #[arg(long)]
    pub embedded_ledger: bool,
}

#[derive(Debug, Clone)]
pub enum LedgerTarget {
    Remote { url: String, contract: Address },
    Embedded,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen_addr: SocketAddr,
    pub ledger: LedgerTarget,
    pub admin: Credential,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl RelayConfig {
    pub fn from_args(args: RelayArgs) -> Result<Self> {
        let listen_addr: SocketAddr = format!("{}:{}", args.bind, args.port)
            .parse()
            .map_err(|_| ChaincareError::config(format!("invalid bind address {}", args.bind)))?;

        let admin_key = non_empty(args.admin_private_key).ok_or_else(|| {
            ChaincareError::config("ADMIN_PRIVATE_KEY is not set. The relay cannot send transactions.")
        })?;
        let admin = Credential::from_hex(&admin_key)?;

        let jwt_secret = non_empty(args.jwt_secret)
            .ok_or_else(|| ChaincareError::config("JWT_SECRET is not set."))?;

        let ledger = if args.embedded_ledger {
            LedgerTarget::Embedded
        } else {
            let raw = non_empty(args.contract_address).ok_or_else(|| {
                ChaincareError::config(
                    "POLICY_CONTRACT_ADDRESS is not set. Deploy the contract and update the configuration.",
                )
            })?;
            let contract = raw
                .parse()
                .map_err(|_| ChaincareError::config(format!("invalid contract address {raw}")))?;
            LedgerTarget::Remote {
                url: args.ledger_url,
                contract,
            }
        };

        if args.admin_username.trim().is_empty() {
            return Err(ChaincareError::config("ADMIN_USERNAME must not be empty"));
        }

        Ok(Self {
            listen_addr,
            ledger,
            admin,
            jwt_secret,
            token_ttl: Duration::from_secs(args.token_ttl_secs),
            admin_username: args.admin_username,
            admin_password: non_empty(args.admin_password),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
