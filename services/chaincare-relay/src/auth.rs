//! Bearer token authentication
//!
//! Tokens are HS256 JWTs naming the user id. Every authenticated request
//! re-resolves the user, so a token for a removed user stops working.

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::UserRecord;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chaincare_core::{ChaincareError, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtConfig {
    secret: Arc<str>,
    ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: Arc::from(secret.into()),
            ttl,
        }
    }

    pub fn issue(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ChaincareError::internal(format!("token encoding failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!("JWT validation failed: {}", e);
            ChaincareError::Unauthenticated {
                reason: "Invalid token".to_string(),
            }
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ChaincareError::Unauthenticated {
            reason: "No token provided".to_string(),
        })?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ChaincareError::Unauthenticated {
            reason: "Authorization header must use Bearer scheme".to_string(),
        })
}

/// Any user holding a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRecord);

/// The user whose username matches the configured admin username.
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserRecord);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt.verify(token)?;

        let user = Uuid::parse_str(&claims.sub)
            .ok()
            .and_then(|id| state.users.get(&id))
            .ok_or_else(|| ChaincareError::Unauthenticated {
                reason: "Token does not name a known user".to_string(),
            })?;

        debug!("Authenticated request from {}", user.username);
        Ok(AuthUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !state.is_admin(&user) {
            warn!("User {} attempted an admin action", user.username);
            return Err(ChaincareError::Forbidden {
                reason: "Admin access required".to_string(),
            }
            .into());
        }

        Ok(AdminUser(user))
    }
}
