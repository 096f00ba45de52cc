//! Transport records for ledger data
//!
//! Ids become strings and amounts are given twice: as a decimal ether string
//! for display and as integer wei for exact arithmetic.

use chaincare_core::{Address, Claim, ClaimStatus, Policy, Wei};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub id: String,
    pub user: Address,
    pub policy_details: String,
    pub premium: String,
    pub premium_wei: Wei,
    pub is_active: bool,
}

impl From<Policy> for PolicyRecord {
    fn from(policy: Policy) -> Self {
        Self {
            id: policy.id.to_string(),
            user: policy.holder,
            policy_details: policy.details,
            premium: policy.premium.to_ether_string(),
            premium_wei: policy.premium,
            is_active: policy.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub id: String,
    pub policy_id: String,
    pub claimant: Address,
    pub reason: String,
    pub amount: String,
    pub amount_wei: Wei,
    pub status: ClaimStatus,
}

impl From<Claim> for ClaimRecord {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id.to_string(),
            policy_id: claim.policy_id.to_string(),
            claimant: claim.claimant,
            reason: claim.reason,
            amount: claim.amount.to_ether_string(),
            amount_wei: claim.amount,
            status: claim.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_record_renders_ether_and_string_id() {
        let premium = Wei::from_ether_str("1.5").unwrap();
        let policy = Policy::new(4, Address::new([1; 20]), "Dental".to_string(), premium);

        let json = serde_json::to_value(PolicyRecord::from(policy)).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "4",
                "user": Address::new([1; 20]).to_string(),
                "policyDetails": "Dental",
                "premium": "1.5",
                "premiumWei": "1500000000000000000",
                "isActive": true
            })
        );
    }

    #[test]
    fn claim_record_status_is_a_name() {
        let claim = Claim::new(
            0,
            2,
            Address::new([9; 20]),
            "Broken arm".to_string(),
            Wei::from(10u64),
        );

        let json = serde_json::to_value(ClaimRecord::from(claim)).unwrap();
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["policyId"], "2");
        assert_eq!(json["amountWei"], "10");
    }
}
