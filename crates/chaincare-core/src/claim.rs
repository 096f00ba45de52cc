//! Claim records and their resolution state

use crate::address::Address;
use crate::amount::Wei;
use crate::error::{ChaincareError, Result};
use crate::policy::PolicyId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ClaimId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ClaimStatus::Pending)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: ClaimId,
    pub policy_id: PolicyId,
    pub claimant: Address,
    pub reason: String,
    pub amount: Wei,
    pub status: ClaimStatus,
}

impl Claim {
    pub fn new(
        id: ClaimId,
        policy_id: PolicyId,
        claimant: Address,
        reason: String,
        amount: Wei,
    ) -> Self {
        Self {
            id,
            policy_id,
            claimant,
            reason,
            amount,
            status: ClaimStatus::Pending,
        }
    }

    /// Move a pending claim to its final status. Resolved claims never change again.
    pub fn resolve(&mut self, outcome: ClaimStatus) -> Result<()> {
        if outcome == ClaimStatus::Pending {
            return Err(ChaincareError::validation(
                "a claim can only be resolved to Approved or Rejected",
            ));
        }
        if self.status.is_resolved() {
            return Err(ChaincareError::ClaimAlreadyResolved { claim_id: self.id });
        }
        self.status = outcome;
        Ok(())
    }
}
