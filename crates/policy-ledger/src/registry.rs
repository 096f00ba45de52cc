//! Policy Registry Contract
//!
//! The on-ledger state machine for policies and claims. Every mutating call
//! takes the caller identity explicitly, validates completely before it
//! touches state, and returns the events it emitted. A call that fails leaves
//! the registry exactly as it was.

use crate::transaction::ContractCall;
use chaincare_core::{
    Address, ChaincareError, Claim, ClaimId, ClaimStatus, Policy, PolicyId, Result, Wei,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Lifecycle events emitted by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum RegistryEvent {
    #[serde(rename_all = "camelCase")]
    PolicyCreated {
        id: PolicyId,
        holder: Address,
        premium: Wei,
    },
    #[serde(rename_all = "camelCase")]
    PolicyCancelled { id: PolicyId },
    #[serde(rename_all = "camelCase")]
    ClaimSubmitted {
        id: ClaimId,
        policy_id: PolicyId,
        claimant: Address,
        amount: Wei,
    },
    #[serde(rename_all = "camelCase")]
    ClaimApproved { id: ClaimId },
    #[serde(rename_all = "camelCase")]
    ClaimRejected { id: ClaimId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRegistry {
    admin: Address,
    policies: Vec<Policy>,
    claims: Vec<Claim>,
}

impl PolicyRegistry {
    /// Deploy a registry owned by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            policies: Vec::new(),
            claims: Vec::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn policy_count(&self) -> u64 {
        self.policies.len() as u64
    }

    pub fn claim_count(&self) -> u64 {
        self.claims.len() as u64
    }

    fn only_admin(&self, caller: &Address) -> Result<()> {
        if *caller != self.admin {
            return Err(ChaincareError::Unauthorized);
        }
        Ok(())
    }

    #[instrument(skip(self, details))]
    pub fn create_policy(
        &mut self,
        caller: &Address,
        holder: Address,
        details: String,
        premium: Wei,
    ) -> Result<Vec<RegistryEvent>> {
        self.only_admin(caller)?;

        let id = self.policy_count();
        self.policies.push(Policy::new(id, holder, details, premium));
        debug!("Policy {} created", id);

        Ok(vec![RegistryEvent::PolicyCreated {
            id,
            holder,
            premium,
        }])
    }

    /// Deactivate a policy. Cancelling an inactive policy succeeds again.
    #[instrument(skip(self))]
    pub fn cancel_policy(&mut self, caller: &Address, id: PolicyId) -> Result<Vec<RegistryEvent>> {
        self.only_admin(caller)?;

        let policy = slot(id)
            .and_then(|index| self.policies.get_mut(index))
            .ok_or(ChaincareError::PolicyNotFound { policy_id: id })?;
        policy.active = false;
        debug!("Policy {} cancelled", id);

        Ok(vec![RegistryEvent::PolicyCancelled { id }])
    }

    /// Open a claim against an existing policy. Any caller may submit.
    #[instrument(skip(self, reason))]
    pub fn submit_claim(
        &mut self,
        caller: &Address,
        policy_id: PolicyId,
        reason: String,
        amount: Wei,
    ) -> Result<Vec<RegistryEvent>> {
        if policy_id >= self.policy_count() {
            return Err(ChaincareError::PolicyNotFound { policy_id });
        }

        let id = self.claim_count();
        self.claims
            .push(Claim::new(id, policy_id, *caller, reason, amount));
        debug!("Claim {} submitted against policy {}", id, policy_id);

        Ok(vec![RegistryEvent::ClaimSubmitted {
            id,
            policy_id,
            claimant: *caller,
            amount,
        }])
    }

    #[instrument(skip(self))]
    pub fn approve_claim(&mut self, caller: &Address, id: ClaimId) -> Result<Vec<RegistryEvent>> {
        self.resolve_claim(caller, id, ClaimStatus::Approved)?;
        Ok(vec![RegistryEvent::ClaimApproved { id }])
    }

    #[instrument(skip(self))]
    pub fn reject_claim(&mut self, caller: &Address, id: ClaimId) -> Result<Vec<RegistryEvent>> {
        self.resolve_claim(caller, id, ClaimStatus::Rejected)?;
        Ok(vec![RegistryEvent::ClaimRejected { id }])
    }

    fn resolve_claim(&mut self, caller: &Address, id: ClaimId, outcome: ClaimStatus) -> Result<()> {
        self.only_admin(caller)?;

        let claim = slot(id)
            .and_then(|index| self.claims.get_mut(index))
            .ok_or(ChaincareError::ClaimNotFound { claim_id: id })?;
        claim.resolve(outcome)?;
        debug!("Claim {} resolved as {}", id, outcome);
        Ok(())
    }

    /// Dispatch an ABI call on behalf of `caller`.
    pub fn execute(&mut self, caller: &Address, call: &ContractCall) -> Result<Vec<RegistryEvent>> {
        match call {
            ContractCall::CreatePolicy {
                holder,
                details,
                premium,
            } => self.create_policy(caller, *holder, details.clone(), *premium),
            ContractCall::CancelPolicy { id } => self.cancel_policy(caller, *id),
            ContractCall::SubmitClaim {
                policy_id,
                reason,
                amount,
            } => self.submit_claim(caller, *policy_id, reason.clone(), *amount),
            ContractCall::ApproveClaim { id } => self.approve_claim(caller, *id),
            ContractCall::RejectClaim { id } => self.reject_claim(caller, *id),
        }
    }

    /// Read accessor matching the public `policies(id)` mapping.
    pub fn policies(&self, id: PolicyId) -> Result<&Policy> {
        slot(id)
            .and_then(|index| self.policies.get(index))
            .ok_or(ChaincareError::PolicyNotFound { policy_id: id })
    }

    pub fn get_policy(&self, id: PolicyId) -> Result<Policy> {
        self.policies(id).cloned()
    }

    pub fn get_claim(&self, id: ClaimId) -> Result<Claim> {
        slot(id)
            .and_then(|index| self.claims.get(index))
            .cloned()
            .ok_or(ChaincareError::ClaimNotFound { claim_id: id })
    }
}

/// Vector slot for a ledger id. Ids past the platform's address space have none.
fn slot(id: u64) -> Option<usize> {
    usize::try_from(id).ok()
}
