//! # ChainCare Devnode
//!
//! Serves an [`InMemoryLedger`] over the `/ledger` JSON routes that
//! `HttpLedgerClient` speaks. Errors travel as `{kind, message}` so the
//! client can restore their classification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chaincare_core::{endpoints, Address, ChaincareError, Claim, ClaimId, ErrorKind, Policy, PolicyId, VERSION};
use policy_ledger::wire::{Count, ErrorBody, EstimateGasRequest, GasEstimate, GasPrice, Nonce};
use policy_ledger::{ContractInfo, InMemoryLedger, LedgerClient, Receipt, SignedTransaction, TxHash};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct NodeError(ChaincareError);

impl From<ChaincareError> for NodeError {
    fn from(err: ChaincareError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

type NodeResult<T> = std::result::Result<Json<T>, NodeError>;

pub fn create_app(ledger: InMemoryLedger) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(health_check))
        .route(endpoints::LEDGER_CONTRACT, get(contract))
        .route(endpoints::LEDGER_ESTIMATE_GAS, post(estimate_gas))
        .route(endpoints::LEDGER_GAS_PRICE, get(gas_price))
        .route(endpoints::LEDGER_NONCE, get(nonce))
        .route(endpoints::LEDGER_TRANSACTIONS, post(send_transaction))
        .route(endpoints::LEDGER_RECEIPT, get(receipt))
        .route(endpoints::LEDGER_POLICY_COUNT, get(policy_count))
        .route(endpoints::LEDGER_POLICY, get(get_policy))
        .route(endpoints::LEDGER_CLAIM_COUNT, get(claim_count))
        .route(endpoints::LEDGER_CLAIM, get(get_claim))
        .layer(TraceLayer::new_for_http())
        .with_state(ledger)
}

#[instrument(skip(ledger))]
async fn health_check(State(ledger): State<InMemoryLedger>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "chaincare-devnode",
        "version": VERSION,
        "block_number": ledger.block_number()
    }))
}

async fn contract(State(ledger): State<InMemoryLedger>) -> Json<ContractInfo> {
    Json(ledger.contract_info())
}

#[instrument(skip(ledger, request), fields(method = request.call.method()))]
async fn estimate_gas(
    State(ledger): State<InMemoryLedger>,
    Json(request): Json<EstimateGasRequest>,
) -> NodeResult<GasEstimate> {
    let gas = ledger.estimate_gas(&request.from, &request.call).await?;
    Ok(Json(GasEstimate { gas }))
}

async fn gas_price(State(ledger): State<InMemoryLedger>) -> NodeResult<GasPrice> {
    let gas_price = ledger.gas_price().await?;
    Ok(Json(GasPrice { gas_price }))
}

async fn nonce(State(ledger): State<InMemoryLedger>, Path(address): Path<String>) -> NodeResult<Nonce> {
    let address: Address = address.parse()?;
    let nonce = ledger.transaction_count(&address).await?;
    Ok(Json(Nonce { nonce }))
}

#[instrument(skip(ledger, transaction), fields(from = %transaction.request.from, nonce = transaction.request.nonce))]
async fn send_transaction(
    State(ledger): State<InMemoryLedger>,
    Json(transaction): Json<SignedTransaction>,
) -> NodeResult<Receipt> {
    match ledger.send_raw_transaction(transaction).await {
        Ok(receipt) => {
            info!(
                "Mined {} in block {}",
                receipt.transaction_hash, receipt.block_number
            );
            Ok(Json(receipt))
        }
        Err(err) => {
            warn!("Transaction refused: {}", err);
            Err(err.into())
        }
    }
}

async fn receipt(State(ledger): State<InMemoryLedger>, Path(hash): Path<String>) -> NodeResult<Receipt> {
    let hash: TxHash = hash.parse()?;
    ledger
        .receipt(&hash)
        .await?
        .map(Json)
        .ok_or_else(|| NodeError(ChaincareError::Remote {
            kind: ErrorKind::NotFound,
            message: format!("no receipt for {hash}"),
        }))
}

async fn policy_count(State(ledger): State<InMemoryLedger>) -> NodeResult<Count> {
    let count = ledger.policy_count().await?;
    Ok(Json(Count { count }))
}

async fn get_policy(State(ledger): State<InMemoryLedger>, Path(id): Path<PolicyId>) -> NodeResult<Policy> {
    Ok(Json(ledger.get_policy(id).await?))
}

async fn claim_count(State(ledger): State<InMemoryLedger>) -> NodeResult<Count> {
    let count = ledger.claim_count().await?;
    Ok(Json(Count { count }))
}

async fn get_claim(State(ledger): State<InMemoryLedger>, Path(id): Path<ClaimId>) -> NodeResult<Claim> {
    Ok(Json(ledger.get_claim(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> (InMemoryLedger, Router) {
        let ledger = InMemoryLedger::deploy(Address::new([1; 20]));
        (ledger.clone(), create_app(ledger))
    }

    #[tokio::test]
    async fn test_contract_info_is_served() {
        let (ledger, app) = app();
        let (status, body) = get_json(app, "/ledger/contract").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], ledger.contract_info().address.to_string());
        assert_eq!(body["admin"], Address::new([1; 20]).to_string());
    }

    #[tokio::test]
    async fn test_missing_policy_is_not_found_with_kind() {
        let (_ledger, app) = app();
        let (status, body) = get_json(app, "/ledger/policies/3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["message"], "Policy with this ID does not exist");
    }

    #[tokio::test]
    async fn test_malformed_address_is_a_validation_error() {
        let (_ledger, app) = app();
        let (status, body) = get_json(app, "/ledger/accounts/0xnothex/nonce").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn test_unknown_receipt_is_not_found() {
        let (_ledger, app) = app();
        let uri = format!("/ledger/receipts/0x{}", "ab".repeat(32));
        let (status, _) = get_json(app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fresh_counts_are_zero() {
        let (_ledger, app) = app();
        let (_, body) = get_json(app.clone(), "/ledger/policies/count").await;
        assert_eq!(body["count"], 0);
        let (_, body) = get_json(app, "/ledger/claims/count").await;
        assert_eq!(body["count"], 0);
    }
}
