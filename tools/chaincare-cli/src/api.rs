//! Typed client for the relay's REST API

use anyhow::{anyhow, Result};
use chaincare_core::{endpoints, Address, Wei};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub eth_address: Address,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRow {
    pub id: String,
    pub user: Address,
    pub policy_details: String,
    pub premium: String,
    pub premium_wei: Wei,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRow {
    pub id: String,
    pub policy_id: String,
    pub claimant: Address,
    pub reason: String,
    pub amount: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub message: String,
    pub transaction_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePolicy<'a> {
    user_id: &'a str,
    policy_details: &'a str,
    premium: &'a str,
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.request(Method::GET, path).send().await?).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        decode(self.request(Method::POST, path).json(body).send().await?).await
    }

    pub async fn health(&self) -> Result<Value> {
        self.get(endpoints::HEALTH).await
    }

    pub async fn metrics(&self) -> Result<Value> {
        self.get(endpoints::METRICS).await
    }

    pub async fn register(&self, username: &str, password: &str, eth_address: Address) -> Result<String> {
        let body = json!({
            "username": username,
            "password": password,
            "ethAddress": eth_address,
        });
        let reply: Value = self.post(endpoints::API_AUTH_REGISTER, &body).await?;
        Ok(reply["message"].as_str().unwrap_or_default().to_string())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let body = json!({ "username": username, "password": password });
        self.post(endpoints::API_AUTH_LOGIN, &body).await
    }

    pub async fn me(&self) -> Result<User> {
        self.get(endpoints::API_AUTH_ME).await
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.get(endpoints::API_AUTH_USERS).await
    }

    pub async fn policies(&self) -> Result<Vec<PolicyRow>> {
        self.get(endpoints::API_POLICIES).await
    }

    pub async fn create_policy(&self, user_id: &str, details: &str, premium: &str) -> Result<Submitted> {
        let body = CreatePolicy {
            user_id,
            policy_details: details,
            premium,
        };
        self.post(endpoints::API_POLICIES, &body).await
    }

    pub async fn cancel_policy(&self, id: u64) -> Result<Submitted> {
        self.post(&with_id(endpoints::API_POLICY_CANCEL, id), &json!({})).await
    }

    pub async fn claims(&self) -> Result<Vec<ClaimRow>> {
        self.get(endpoints::API_CLAIMS).await
    }

    pub async fn approve_claim(&self, id: u64) -> Result<Submitted> {
        self.post(&with_id(endpoints::API_CLAIM_APPROVE, id), &json!({})).await
    }

    pub async fn reject_claim(&self, id: u64) -> Result<Submitted> {
        self.post(&with_id(endpoints::API_CLAIM_REJECT, id), &json!({})).await
    }
}

fn with_id(template: &str, id: u64) -> String {
    template.replace("{id}", &id.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&body)?);
    }
    Err(anyhow!(describe_failure(status.as_u16(), &body)))
}

/// Human readable text for a relay error body `{message, error}`.
fn describe_failure(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => {
            let message = value["message"].as_str().unwrap_or("request failed");
            match value["error"].as_str() {
                Some(cause) => format!("{message} ({status}): {cause}"),
                None => format!("{message} ({status})"),
            }
        }
        Err(_) => format!("relay answered {status}: {}", String::from_utf8_lossy(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_route_ids() {
        assert_eq!(with_id(endpoints::API_CLAIM_APPROVE, 3), "/api/claims/3/approve");
        assert_eq!(with_id(endpoints::API_POLICY_CANCEL, 0), "/api/policies/0/cancel");
    }

    #[test]
    fn describes_relay_failures() {
        let body = br#"{"message":"Failed to approve claim","error":"claim already resolved"}"#;
        assert_eq!(
            describe_failure(500, body),
            "Failed to approve claim (500): claim already resolved"
        );
        assert_eq!(
            describe_failure(403, br#"{"message":"Forbidden: Admin access required"}"#),
            "Forbidden: Admin access required (403)"
        );
        assert_eq!(describe_failure(502, b"bad gateway"), "relay answered 502: bad gateway");
    }

    #[test]
    fn base_url_is_normalised() {
        let client = RelayClient::new("http://localhost:8000/", None);
        assert_eq!(client.url("/health"), "http://localhost:8000/health");
    }
}
