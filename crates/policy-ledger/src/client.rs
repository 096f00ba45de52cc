//! Ledger runtime seam
//!
//! Everything outside the ledger talks to it through [`LedgerClient`]; the
//! in-memory dev chain and the HTTP client both implement it.

use crate::transaction::{ContractCall, Receipt, SignedTransaction, TxHash};
use async_trait::async_trait;
use chaincare_core::{Address, Claim, ClaimId, Policy, PolicyId, Result, Wei};
use serde::{Deserialize, Serialize};

/// Deployed registry identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: Address,
    pub admin: Address,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn contract(&self) -> Result<ContractInfo>;

    /// Gas the call would use if sent now by `from`. Fails if the call would revert.
    async fn estimate_gas(&self, from: &Address, call: &ContractCall) -> Result<u64>;

    async fn gas_price(&self) -> Result<Wei>;

    /// Next nonce for `address`.
    async fn transaction_count(&self, address: &Address) -> Result<u64>;

    async fn send_raw_transaction(&self, transaction: SignedTransaction) -> Result<Receipt>;

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>>;

    async fn policy_count(&self) -> Result<u64>;

    async fn claim_count(&self) -> Result<u64>;

    async fn get_policy(&self, id: PolicyId) -> Result<Policy>;

    async fn get_claim(&self, id: ClaimId) -> Result<Claim>;
}
