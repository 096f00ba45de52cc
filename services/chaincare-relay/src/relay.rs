//! Ledger access for the HTTP layer
//!
//! Reads walk the registry from id 0 up to the current count. Writes are
//! signed with the relay's admin credential and go through the shared
//! [`TransactionSender`].

use crate::records::{ClaimRecord, PolicyRecord};
use admin_signer::{Credential, TransactionSender};
use chaincare_core::{Address, ClaimId, PolicyId, Result, Wei};
use metrics::RelayMetrics;
use policy_ledger::{ContractCall, LedgerClient, Receipt};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Relay {
    sender: TransactionSender,
    admin: Arc<Credential>,
    metrics: RelayMetrics,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("contract", &self.sender.contract())
            .field("admin", &self.admin.address())
            .finish()
    }
}

impl Relay {
    pub fn new(sender: TransactionSender, admin: Credential, metrics: RelayMetrics) -> Self {
        Self {
            sender,
            admin: Arc::new(admin),
            metrics,
        }
    }

    pub fn admin_address(&self) -> Address {
        self.admin.address()
    }

    pub fn contract(&self) -> Address {
        self.sender.contract()
    }

    fn ledger(&self) -> &Arc<dyn LedgerClient> {
        self.sender.ledger()
    }

    #[instrument(skip(self))]
    pub async fn list_policies(&self) -> Result<Vec<PolicyRecord>> {
        let count = self.ledger().policy_count().await?;
        let mut records = Vec::new();
        for id in 0..count {
            let policy = self.ledger().get_policy(id).await?;
            records.push(PolicyRecord::from(policy));
        }
        self.metrics.record_read(count);
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn list_claims(&self) -> Result<Vec<ClaimRecord>> {
        let count = self.ledger().claim_count().await?;
        let mut records = Vec::new();
        for id in 0..count {
            let claim = self.ledger().get_claim(id).await?;
            records.push(ClaimRecord::from(claim));
        }
        self.metrics.record_read(count);
        Ok(records)
    }

    #[instrument(skip(self, details))]
    pub async fn create_policy(&self, holder: Address, details: String, premium: Wei) -> Result<Receipt> {
        self.submit(ContractCall::CreatePolicy {
            holder,
            details,
            premium,
        })
        .await
    }

    pub async fn cancel_policy(&self, id: PolicyId) -> Result<Receipt> {
        self.submit(ContractCall::CancelPolicy { id }).await
    }

    pub async fn approve_claim(&self, id: ClaimId) -> Result<Receipt> {
        self.submit(ContractCall::ApproveClaim { id }).await
    }

    pub async fn reject_claim(&self, id: ClaimId) -> Result<Receipt> {
        self.submit(ContractCall::RejectClaim { id }).await
    }

    async fn submit(&self, call: ContractCall) -> Result<Receipt> {
        let method = call.method();
        match self.sender.send(&self.admin, call).await {
            Ok(receipt) => {
                self.metrics.record_submitted(method);
                info!("{} relayed as {}", method, receipt.transaction_hash);
                Ok(receipt)
            }
            Err(err) => {
                self.metrics.record_failed(method);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chaincare_core::{ChaincareError, Claim, ClaimStatus, Policy};
    use policy_ledger::{ContractInfo, InMemoryLedger, SignedTransaction, TxHash};

    /// Node that reports registry sizes it cannot serve.
    struct OverstatedCounts(InMemoryLedger);

    #[async_trait]
    impl LedgerClient for OverstatedCounts {
        async fn contract(&self) -> Result<ContractInfo> {
            self.0.contract().await
        }

        async fn estimate_gas(&self, from: &Address, call: &ContractCall) -> Result<u64> {
            self.0.estimate_gas(from, call).await
        }

        async fn gas_price(&self) -> Result<Wei> {
            self.0.gas_price().await
        }

        async fn transaction_count(&self, address: &Address) -> Result<u64> {
            self.0.transaction_count(address).await
        }

        async fn send_raw_transaction(&self, transaction: SignedTransaction) -> Result<Receipt> {
            self.0.send_raw_transaction(transaction).await
        }

        async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
            self.0.receipt(hash).await
        }

        async fn policy_count(&self) -> Result<u64> {
            Ok(u64::MAX)
        }

        async fn claim_count(&self) -> Result<u64> {
            Ok(u64::MAX)
        }

        async fn get_policy(&self, id: PolicyId) -> Result<Policy> {
            self.0.get_policy(id).await
        }

        async fn get_claim(&self, id: ClaimId) -> Result<Claim> {
            self.0.get_claim(id).await
        }
    }

    fn setup() -> (Credential, InMemoryLedger, Relay) {
        let admin = Credential::from_hex(&"22".repeat(32)).unwrap();
        let ledger = InMemoryLedger::deploy(admin.address());
        let sender = TransactionSender::new(Arc::new(ledger.clone()), ledger.contract_info().address);
        let relay = Relay::new(sender, admin.clone(), RelayMetrics::new());
        (admin, ledger, relay)
    }

    #[tokio::test]
    async fn test_policies_are_listed_in_ledger_order() {
        let (_admin, _ledger, relay) = setup();
        for (i, details) in ["Health", "Dental", "Vision"].iter().enumerate() {
            relay
                .create_policy(Address::new([i as u8 + 1; 20]), details.to_string(), Wei::from(100u64))
                .await
                .unwrap();
        }

        let policies = relay.list_policies().await.unwrap();
        let ids: Vec<&str> = policies.iter().map(|p| p.id.as_str()).collect();
        let details: Vec<&str> = policies.iter().map(|p| p.policy_details.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
        assert_eq!(details, ["Health", "Dental", "Vision"]);
    }

    #[tokio::test]
    async fn test_claim_resolution_is_visible_in_listing() {
        let (_admin, ledger, relay) = setup();
        let user = Credential::from_hex(&"33".repeat(32)).unwrap();
        relay
            .create_policy(user.address(), "Health".to_string(), Wei::from(1u64))
            .await
            .unwrap();

        let user_sender = TransactionSender::new(Arc::new(ledger.clone()), relay.contract());
        user_sender
            .send(
                &user,
                ContractCall::SubmitClaim {
                    policy_id: 0,
                    reason: "Checkup".to_string(),
                    amount: Wei::from(5u64),
                },
            )
            .await
            .unwrap();

        relay.reject_claim(0).await.unwrap();
        let claims = relay.list_claims().await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].status, ClaimStatus::Rejected);
        assert_eq!(claims[0].claimant, user.address());
    }

    #[tokio::test]
    async fn test_overstated_counts_fail_the_read() {
        let admin = Credential::from_hex(&"22".repeat(32)).unwrap();
        let ledger = InMemoryLedger::deploy(admin.address());
        let contract = ledger.contract_info().address;
        let sender = TransactionSender::new(Arc::new(OverstatedCounts(ledger)), contract);
        let relay = Relay::new(sender, admin, RelayMetrics::new());

        let err = relay.list_policies().await.unwrap_err();
        assert!(matches!(err, ChaincareError::PolicyNotFound { policy_id: 0 }));
        let err = relay.list_claims().await.unwrap_err();
        assert!(matches!(err, ChaincareError::ClaimNotFound { claim_id: 0 }));
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let (_admin, _ledger, relay) = setup();
        assert!(relay.cancel_policy(42).await.is_err());

        let snapshot = relay.metrics.snapshot();
        assert_eq!(snapshot.transactions_failed, 1);
        assert_eq!(snapshot.methods["cancelPolicy"].failed, 1);
    }
}
