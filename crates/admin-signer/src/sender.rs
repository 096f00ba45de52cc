//! Serialized transaction submission
//!
//! Fetching a nonce, signing and submitting must not interleave for one
//! signing identity, or two in-flight transactions pick the same nonce.
//! Each address gets its own async mutex held across the whole sequence;
//! distinct identities still submit in parallel.

use crate::credential::Credential;
use chaincare_core::{Address, Result};
use dashmap::DashMap;
use policy_ledger::{ContractCall, LedgerClient, Receipt, TransactionRequest};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct TransactionSender {
    ledger: Arc<dyn LedgerClient>,
    contract: Address,
    /// One submission lane per signing address
    lanes: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSender")
            .field("contract", &self.contract)
            .field("lanes", &self.lanes.len())
            .finish()
    }
}

impl TransactionSender {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: Address) -> Self {
        Self {
            ledger,
            contract,
            lanes: Arc::new(DashMap::new()),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    fn lane(&self, address: Address) -> Arc<Mutex<()>> {
        self.lanes.entry(address).or_default().value().clone()
    }

    /// Estimate, price, nonce, sign and submit one call. Not retried.
    #[instrument(skip(self, credential, call), fields(from = %credential.address(), method = call.method()))]
    pub async fn send(&self, credential: &Credential, call: ContractCall) -> Result<Receipt> {
        let from = credential.address();
        let lane = self.lane(from);
        let _turn = lane.lock().await;

        let gas_limit = self.ledger.estimate_gas(&from, &call).await?;
        let gas_price = self.ledger.gas_price().await?;
        let nonce = self.ledger.transaction_count(&from).await?;
        debug!(gas_limit, %gas_price, nonce, "Prepared transaction");

        let request = TransactionRequest {
            from,
            to: self.contract,
            nonce,
            gas_limit,
            gas_price,
            call,
        };

        info!("Signing transaction for {}", from);
        let signed = credential.sign(request)?;

        match self.ledger.send_raw_transaction(signed).await {
            Ok(receipt) => {
                info!(
                    "Transaction {} included in block {}",
                    receipt.transaction_hash, receipt.block_number
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!("Transaction from {} failed: {}", from, err);
                Err(err)
            }
        }
    }
}
