//! Shared request state

use crate::auth::JwtConfig;
use crate::config::{LedgerTarget, RelayConfig};
use crate::relay::Relay;
use crate::users::{UserRecord, UserStore};
use admin_signer::{HttpLedgerClient, TransactionSender};
use chaincare_core::{ChaincareError, Result};
use metrics::RelayMetrics;
use policy_ledger::{InMemoryLedger, LedgerClient};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppState {
    pub relay: Relay,
    pub users: UserStore,
    pub jwt: JwtConfig,
    pub metrics: RelayMetrics,
    admin_username: Arc<str>,
}

impl AppState {
    pub fn new(
        relay: Relay,
        users: UserStore,
        jwt: JwtConfig,
        metrics: RelayMetrics,
        admin_username: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            users,
            jwt,
            metrics,
            admin_username: Arc::from(admin_username.into()),
        }
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub fn is_admin(&self, user: &UserRecord) -> bool {
        user.username == *self.admin_username
    }

    /// Connect to the configured ledger and seed the admin account if a
    /// password was given.
    pub async fn from_config(config: &RelayConfig) -> Result<Self> {
        let admin_address = config.admin.address();

        let (ledger, contract) = match &config.ledger {
            LedgerTarget::Embedded => {
                let ledger = InMemoryLedger::deploy(admin_address);
                let contract = ledger.contract_info().address;
                info!("Deployed embedded ledger contract at {}", contract);
                let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);
                (ledger, contract)
            }
            LedgerTarget::Remote { url, contract } => {
                let client = HttpLedgerClient::new(url.clone());
                match client.contract().await {
                    Ok(info) if info.address != *contract => {
                        return Err(ChaincareError::config(format!(
                            "ledger at {} serves contract {}, expected {}",
                            url, info.address, contract
                        )));
                    }
                    Ok(info) if info.admin != admin_address => {
                        warn!(
                            "Relay key {} is not the contract admin {}; writes will be refused",
                            admin_address, info.admin
                        );
                    }
                    Ok(_) => info!("Connected to ledger at {}", url),
                    Err(err) => warn!("Ledger at {} not reachable yet: {}", url, err),
                }
                let ledger: Arc<dyn LedgerClient> = Arc::new(client);
                (ledger, *contract)
            }
        };

        let metrics = RelayMetrics::new();
        let sender = TransactionSender::new(ledger, contract);
        let relay = Relay::new(sender, config.admin.clone(), metrics.clone());
        let users = UserStore::new();

        if let Some(password) = &config.admin_password {
            users
                .register(&config.admin_username, password, admin_address)
                .await?;
            info!("Seeded admin account {}", config.admin_username);
        }

        Ok(Self::new(
            relay,
            users,
            JwtConfig::new(config.jwt_secret.clone(), config.token_ttl),
            metrics,
            config.admin_username.clone(),
        ))
    }
}
