//! Policy records

use crate::address::Address;
use crate::amount::Wei;
use serde::{Deserialize, Serialize};

pub type PolicyId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: PolicyId,
    pub holder: Address,
    pub details: String,
    pub premium: Wei,
    pub active: bool,
}

impl Policy {
    pub fn new(id: PolicyId, holder: Address, details: String, premium: Wei) -> Self {
        Self {
            id,
            holder,
            details,
            premium,
            active: true,
        }
    }
}
