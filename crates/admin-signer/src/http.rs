//! [`LedgerClient`] over the development node's JSON API

use async_trait::async_trait;
use chaincare_core::{endpoints, Address, ChaincareError, Claim, ClaimId, Policy, PolicyId, Result, Wei};
use policy_ledger::wire::{Count, ErrorBody, EstimateGasRequest, GasEstimate, GasPrice, Nonce};
use policy_ledger::{ContractCall, ContractInfo, LedgerClient, Receipt, SignedTransaction, TxHash};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpLedgerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ChaincareError::unavailable(e.to_string()))?;
        decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ChaincareError::unavailable(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ChaincareError::unavailable(e.to_string()))?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => Err(body.into()),
        Err(_) => Err(ChaincareError::unavailable(format!(
            "ledger node answered {}: {}",
            status,
            String::from_utf8_lossy(&bytes)
        ))),
    }
}

fn with_param(template: &str, name: &str, value: impl ToString) -> String {
    template.replace(&format!("{{{name}}}"), &value.to_string())
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn contract(&self) -> Result<ContractInfo> {
        self.get(endpoints::LEDGER_CONTRACT).await
    }

    async fn estimate_gas(&self, from: &Address, call: &ContractCall) -> Result<u64> {
        let body = EstimateGasRequest {
            from: *from,
            call: call.clone(),
        };
        let estimate: GasEstimate = self.post(endpoints::LEDGER_ESTIMATE_GAS, &body).await?;
        Ok(estimate.gas)
    }

    async fn gas_price(&self) -> Result<Wei> {
        let price: GasPrice = self.get(endpoints::LEDGER_GAS_PRICE).await?;
        Ok(price.gas_price)
    }

    async fn transaction_count(&self, address: &Address) -> Result<u64> {
        let nonce: Nonce = self
            .get(&with_param(endpoints::LEDGER_NONCE, "address", address))
            .await?;
        Ok(nonce.nonce)
    }

    async fn send_raw_transaction(&self, transaction: SignedTransaction) -> Result<Receipt> {
        self.post(endpoints::LEDGER_TRANSACTIONS, &transaction).await
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let path = with_param(endpoints::LEDGER_RECEIPT, "hash", hash);
        let response = self
            .http
            .get(self.url(&path))
            .send()
            .await
            .map_err(|e| ChaincareError::unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    async fn policy_count(&self) -> Result<u64> {
        let count: Count = self.get(endpoints::LEDGER_POLICY_COUNT).await?;
        Ok(count.count)
    }

    async fn claim_count(&self) -> Result<u64> {
        let count: Count = self.get(endpoints::LEDGER_CLAIM_COUNT).await?;
        Ok(count.count)
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Policy> {
        self.get(&with_param(endpoints::LEDGER_POLICY, "id", id)).await
    }

    async fn get_claim(&self, id: ClaimId) -> Result<Claim> {
        self.get(&with_param(endpoints::LEDGER_CLAIM, "id", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_path_parameters() {
        assert_eq!(
            with_param(endpoints::LEDGER_POLICY, "id", 7),
            "/ledger/policies/7"
        );
        assert_eq!(
            with_param(endpoints::LEDGER_NONCE, "address", Address::ZERO),
            "/ledger/accounts/0x0000000000000000000000000000000000000000/nonce"
        );
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = HttpLedgerClient::new("http://127.0.0.1:7545/");
        assert_eq!(client.url("/health"), "http://127.0.0.1:7545/health");
    }

    #[tokio::test]
    async fn unreachable_node_is_an_infrastructure_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let client = HttpLedgerClient::new("http://127.0.0.1:9");
        let err = client.policy_count().await.unwrap_err();
        assert_eq!(err.kind(), chaincare_core::ErrorKind::Infrastructure);
    }
}
