// SPDX-License-Identifier: Apache-2.0

//! Bearer-token verification and lazy identity provisioning.
//!
//! Tokens are `v1.<payload>.<sig>`: a base64url JSON payload signed with
//! HMAC-SHA256 over the encoded payload. This service only verifies —
//! issuance belongs to the identity provider. The first verified request a
//! user makes provisions their row from the token claims; later requests
//! keep profile fields current.

use std::fmt;

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use corkboard_api::ApiError;
use corkboard_core::{now_ms, UserId};
use corkboard_model::User;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TokenError {
    Malformed,
    UnsupportedVersion,
    InvalidSignature,
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => f.write_str("malformed token"),
            Self::UnsupportedVersion => f.write_str("unsupported token version"),
            Self::InvalidSignature => f.write_str("invalid token signature"),
            Self::Expired => f.write_str("token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenClaims {
    pub sub: UserId,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

fn sign_payload(payload_b64: &str, secret: &[u8]) -> Result<String, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(payload_b64.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Produce a signed token for the given claims. The server itself never
/// calls this on a request path; it exists for the issuing side of the
/// contract and for tests.
pub fn sign_token(claims: &TokenClaims, secret: &[u8]) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
    let sig = sign_payload(&payload_b64, secret)?;
    Ok(format!("{TOKEN_VERSION_V1}.{payload_b64}.{sig}"))
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify_token(token: &str, secret: &[u8], now_ms: i64) -> Result<TokenClaims, TokenError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::Malformed);
    }
    let mut parts = token.splitn(3, '.');
    let (version, payload_b64, sig_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(v), Some(p), Some(s)) if !p.is_empty() && !s.is_empty() => (v, p, s),
        _ => return Err(TokenError::Malformed),
    };
    if version != TOKEN_VERSION_V1 {
        return Err(TokenError::UnsupportedVersion);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(payload_b64.as_bytes());
    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| TokenError::InvalidSignature)?;
    mac.verify_slice(&sig)
        .map_err(|_| TokenError::InvalidSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
    if claims.expires_at <= now_ms {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::to_string)
}

/// Authenticate a request: verify the bearer token, then resolve (and on
/// first sight provision) the user row from its claims.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token =
        bearer_token(headers).ok_or_else(|| ApiError::unauthenticated("Access token required"))?;
    authenticate_token(state, &token).await
}

pub async fn authenticate_token(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = verify_token(token, state.config.token_secret.as_bytes(), now_ms())
        .map_err(|e| ApiError::unauthenticated(format!("Invalid token: {e}")))?;
    // Cap the validity window at the configured expiry: a well-signed token
    // claiming a longer lifetime than the issuing contract allows is
    // treated as invalid.
    let max_ttl_ms = state.config.token_ttl.as_millis() as i64;
    if claims.expires_at.saturating_sub(claims.issued_at) > max_ttl_ms {
        return Err(ApiError::unauthenticated("Invalid token: lifetime too long"));
    }

    let provisional = User {
        id: claims.sub.clone(),
        email: claims.email,
        display_name: claims.name,
        avatar_url: claims.avatar_url,
        created_at: now_ms(),
    };
    let mut store = state.store.lock().await;
    store
        .upsert_user(&provisional)
        .map_err(|e| state.internal_error("user provisioning failed", &e))?;
    let user = store
        .user_by_id(&claims.sub)
        .map_err(|e| state.internal_error("user lookup failed", &e))?;
    user.ok_or_else(ApiError::internal)
}
