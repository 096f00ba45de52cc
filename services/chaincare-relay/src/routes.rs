use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::records::{ClaimRecord, PolicyRecord};
use crate::state::AppState;
use crate::users::PublicUser;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chaincare_core::{endpoints, Address, ChaincareError, ClaimId, PolicyId, Result, Wei, VERSION};
use policy_ledger::TxHash;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};
use uuid::Uuid;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(health_check))
        .route(endpoints::METRICS, get(metrics))
        .route(endpoints::API_AUTH_REGISTER, post(register))
        .route(endpoints::API_AUTH_LOGIN, post(login))
        .route(endpoints::API_AUTH_ME, get(me))
        .route(endpoints::API_AUTH_USERS, get(list_users))
        .route(
            endpoints::API_POLICIES,
            get(list_policies).post(create_policy),
        )
        .route(endpoints::API_POLICY_CANCEL, post(cancel_policy))
        .route(endpoints::API_CLAIMS, get(list_claims))
        .route(endpoints::API_CLAIM_APPROVE, post(approve_claim))
        .route(endpoints::API_CLAIM_REJECT, post(reject_claim))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
    eth_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: PublicUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePolicyRequest {
    user_id: Option<String>,
    policy_details: Option<String>,
    premium: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponse {
    message: String,
    transaction_hash: TxHash,
}

impl TransactionResponse {
    fn new(message: impl Into<String>, transaction_hash: TxHash) -> Json<Self> {
        Json(Self {
            message: message.into(),
            transaction_hash,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Premium in ether: a whole number or a decimal string. Floats are refused
/// so no precision is lost before conversion to wei. A zero premium counts
/// as missing.
fn parse_premium(value: &Value) -> Result<Wei> {
    let premium = match value {
        Value::Number(n) => match n.as_u64() {
            Some(whole) => Wei::from_ether_str(&whole.to_string())?,
            None => {
                return Err(ChaincareError::InvalidAmount {
                    reason: "premium must be a whole number or a decimal string".to_string(),
                })
            }
        },
        Value::String(s) => Wei::from_ether_str(s)?,
        _ => {
            return Err(ChaincareError::InvalidAmount {
                reason: "premium must be a whole number or a decimal string".to_string(),
            })
        }
    };
    if premium.is_zero() {
        return Err(ChaincareError::InvalidAmount {
            reason: "premium must be greater than zero".to_string(),
        });
    }
    Ok(premium)
}

#[instrument(skip(state))]
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "chaincare-relay",
        "version": VERSION,
        "contract": state.relay.contract(),
        "admin": state.relay.admin_address()
    }))
}

#[instrument(skip(state))]
async fn metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "chaincare-relay",
        "registered_users": state.users.len(),
        "relay": state.metrics.snapshot()
    }))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> std::result::Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(username), Some(password), Some(eth_address)) = (
        required(payload.username),
        required(payload.password),
        required(payload.eth_address),
    ) else {
        return Err(ChaincareError::validation("username, password and ethAddress are required").into());
    };

    let eth_address: Address = eth_address.parse()?;
    if username.trim() == state.admin_username() && eth_address != state.relay.admin_address() {
        return Err(ChaincareError::Forbidden {
            reason: "the admin account must be bound to the relay admin address".to_string(),
        }
        .into());
    }
    state.users.register(&username, &password, eth_address).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> std::result::Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ChaincareError::InvalidCredentials.into());
    };

    let user = state.users.authenticate(&username, &password).await?;
    let token = state.jwt.issue(&user)?;
    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user: user.public(),
    }))
}

#[instrument]
async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.public())
}

#[instrument(skip(state))]
async fn list_users(_admin: AdminUser, State(state): State<AppState>) -> Json<Vec<PublicUser>> {
    Json(state.users.list())
}

#[instrument(skip(state))]
async fn list_policies(
    _user: AuthUser,
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<PolicyRecord>>, ApiError> {
    let policies = state
        .relay
        .list_policies()
        .await
        .map_err(|e| ApiError::ledger("Failed to fetch policies", e))?;
    Ok(Json(policies))
}

#[instrument(skip(state, payload))]
async fn create_policy(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePolicyRequest>,
) -> std::result::Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let (Some(user_id), Some(details), Some(premium)) = (
        required(payload.user_id),
        required(payload.policy_details),
        payload.premium.filter(|p| !p.is_null()),
    ) else {
        return Err(ChaincareError::validation("Missing required fields").into());
    };

    let premium = parse_premium(&premium)?;
    let holder = Uuid::parse_str(&user_id)
        .ok()
        .and_then(|id| state.users.get(&id))
        .ok_or_else(|| ChaincareError::UserNotFound {
            user_id: user_id.clone(),
        })?;

    info!(
        "Admin {} creating policy for {} ({})",
        admin.username, holder.username, holder.eth_address
    );
    let receipt = state
        .relay
        .create_policy(holder.eth_address, details, premium)
        .await
        .map_err(|e| ApiError::ledger("Failed to create policy", e))?;

    Ok((
        StatusCode::CREATED,
        TransactionResponse::new("Policy created successfully", receipt.transaction_hash),
    ))
}

#[instrument(skip(state))]
async fn cancel_policy(
    _admin: AdminUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<PolicyId>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let receipt = state
        .relay
        .cancel_policy(id)
        .await
        .map_err(|e| ApiError::ledger("Failed to cancel policy", e))?;

    Ok(TransactionResponse::new(
        format!("Policy #{id} cancelled successfully"),
        receipt.transaction_hash,
    ))
}

#[instrument(skip(state))]
async fn list_claims(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<ClaimRecord>>, ApiError> {
    let claims = state
        .relay
        .list_claims()
        .await
        .map_err(|e| ApiError::ledger("Failed to fetch claims", e))?;
    Ok(Json(claims))
}

#[instrument(skip(state))]
async fn approve_claim(
    _admin: AdminUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<ClaimId>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let receipt = state
        .relay
        .approve_claim(id)
        .await
        .map_err(|e| ApiError::ledger("Failed to approve claim", e))?;

    Ok(TransactionResponse::new(
        format!("Claim #{id} approved successfully"),
        receipt.transaction_hash,
    ))
}

#[instrument(skip(state))]
async fn reject_claim(
    _admin: AdminUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<ClaimId>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let receipt = state
        .relay
        .reject_claim(id)
        .await
        .map_err(|e| ApiError::ledger("Failed to reject claim", e))?;

    Ok(TransactionResponse::new(
        format!("Claim #{id} rejected successfully"),
        receipt.transaction_hash,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_accepts_integers_and_decimal_strings() {
        assert_eq!(
            parse_premium(&json!(100)).unwrap(),
            Wei::from_ether_str("100").unwrap()
        );
        assert_eq!(
            parse_premium(&json!("0.25")).unwrap(),
            Wei::new(250_000_000_000_000_000)
        );
    }

    #[test]
    fn premium_refuses_floats_and_other_shapes() {
        assert!(parse_premium(&json!(1.5)).is_err());
        assert!(parse_premium(&json!(-3)).is_err());
        assert!(parse_premium(&json!(true)).is_err());
        assert!(parse_premium(&json!("abc")).is_err());
    }

    #[test]
    fn zero_premium_is_refused() {
        for value in [json!(0), json!("0"), json!("0.000")] {
            let err = parse_premium(&value).unwrap_err();
            assert!(matches!(err, ChaincareError::InvalidAmount { .. }), "{value}");
        }
    }
}
