//! In-memory development ledger
//!
//! Hosts one [`PolicyRegistry`] behind a single lock. Admission checks the
//! recovered signer, the target contract, the sender nonce and the gas
//! budget before the call runs; a call that reverts is refused outright and
//! leaves no trace (no state change, no nonce bump, no receipt).

use crate::client::{ContractInfo, LedgerClient};
use crate::gas;
use crate::registry::PolicyRegistry;
use crate::transaction::{keccak256, ContractCall, Receipt, SignedTransaction, TxHash};
use async_trait::async_trait;
use chaincare_core::{Address, ChaincareError, Claim, ClaimId, Policy, PolicyId, Result, Wei};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 1 gwei
pub const DEFAULT_GAS_PRICE: Wei = Wei::new(1_000_000_000);

#[derive(Debug)]
struct ChainState {
    registry: PolicyRegistry,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<TxHash, Receipt>,
    block_number: u64,
}

#[derive(Clone)]
pub struct InMemoryLedger {
    contract: ContractInfo,
    gas_price: Wei,
    chain: Arc<Mutex<ChainState>>,
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain = self.chain.lock();
        f.debug_struct("InMemoryLedger")
            .field("contract", &self.contract.address)
            .field("admin", &self.contract.admin)
            .field("block_number", &chain.block_number)
            .field("policy_count", &chain.registry.policy_count())
            .field("claim_count", &chain.registry.claim_count())
            .finish()
    }
}

impl InMemoryLedger {
    /// Deploy a fresh registry owned by `admin`.
    pub fn deploy(admin: Address) -> Self {
        Self::with_gas_price(admin, DEFAULT_GAS_PRICE)
    }

    pub fn with_gas_price(admin: Address, gas_price: Wei) -> Self {
        let address = contract_address(&admin, 0);
        info!(
            "Deployed policy registry at {} (admin {})",
            address, admin
        );

        Self {
            contract: ContractInfo { address, admin },
            gas_price,
            chain: Arc::new(Mutex::new(ChainState {
                registry: PolicyRegistry::new(admin),
                nonces: HashMap::new(),
                receipts: HashMap::new(),
                block_number: 0,
            })),
        }
    }

    pub fn contract_info(&self) -> ContractInfo {
        self.contract
    }

    pub fn block_number(&self) -> u64 {
        self.chain.lock().block_number
    }

    fn admit(&self, transaction: &SignedTransaction, expected_nonce: u64) -> Result<u64> {
        let request = &transaction.request;

        let signer = transaction.recover_signer()?;
        if signer != request.from {
            return Err(ChaincareError::rejected(format!(
                "signature does not match sender {}",
                request.from
            )));
        }
        if request.to != self.contract.address {
            return Err(ChaincareError::rejected(format!(
                "unknown contract address {}",
                request.to
            )));
        }
        if request.nonce != expected_nonce {
            return Err(ChaincareError::rejected(format!(
                "nonce mismatch for {}: expected {}, got {}",
                request.from, expected_nonce, request.nonce
            )));
        }
        if request.gas_price < self.gas_price {
            return Err(ChaincareError::rejected(format!(
                "gas price {} below minimum {}",
                request.gas_price, self.gas_price
            )));
        }

        let required = gas::cost(&request.call);
        if request.gas_limit < required {
            return Err(ChaincareError::rejected(format!(
                "out of gas: limit {}, required {}",
                request.gas_limit, required
            )));
        }
        Ok(required)
    }
}

/// Deterministic contract address from deployer and deployer nonce.
fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut preimage = deployer.as_bytes().to_vec();
    preimage.extend_from_slice(&nonce.to_be_bytes());
    Address::from_digest(&keccak256(&preimage))
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn contract(&self) -> Result<ContractInfo> {
        Ok(self.contract)
    }

    async fn estimate_gas(&self, from: &Address, call: &ContractCall) -> Result<u64> {
        let mut dry_run = self.chain.lock().registry.clone();
        dry_run.execute(from, call)?;
        Ok(gas::cost(call))
    }

    async fn gas_price(&self) -> Result<Wei> {
        Ok(self.gas_price)
    }

    async fn transaction_count(&self, address: &Address) -> Result<u64> {
        Ok(self.chain.lock().nonces.get(address).copied().unwrap_or(0))
    }

    #[instrument(skip(self, transaction), fields(from = %transaction.request.from, nonce = transaction.request.nonce, method = transaction.request.call.method()))]
    async fn send_raw_transaction(&self, transaction: SignedTransaction) -> Result<Receipt> {
        let hash = transaction.hash()?;
        let mut chain = self.chain.lock();

        let from = transaction.request.from;
        let expected_nonce = chain.nonces.get(&from).copied().unwrap_or(0);
        let gas_used = self.admit(&transaction, expected_nonce).map_err(|e| {
            warn!("Transaction refused: {}", e);
            e
        })?;

        let events = chain
            .registry
            .execute(&from, &transaction.request.call)
            .map_err(|e| {
                warn!("Transaction reverted: {}", e);
                e
            })?;

        chain.nonces.insert(from, expected_nonce + 1);
        chain.block_number += 1;

        let receipt = Receipt {
            transaction_hash: hash,
            block_number: chain.block_number,
            from,
            gas_used,
            events,
        };
        chain.receipts.insert(hash, receipt.clone());

        info!(
            "Included {} in block {}",
            receipt.transaction_hash, receipt.block_number
        );
        Ok(receipt)
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        Ok(self.chain.lock().receipts.get(hash).cloned())
    }

    async fn policy_count(&self) -> Result<u64> {
        Ok(self.chain.lock().registry.policy_count())
    }

    async fn claim_count(&self) -> Result<u64> {
        Ok(self.chain.lock().registry.claim_count())
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Policy> {
        self.chain.lock().registry.get_policy(id)
    }

    async fn get_claim(&self, id: ClaimId) -> Result<Claim> {
        self.chain.lock().registry.get_claim(id)
    }
}
