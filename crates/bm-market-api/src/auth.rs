use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bm_core::{auth, metrics};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

const CHALLENGE_TTL_SECONDS: i64 = 300;

/// Single-use login challenges, keyed by challenge string.
#[derive(Default)]
pub(crate) struct ChallengeStore {
    entries: Mutex<HashMap<String, Challenge>>,
}

struct Challenge {
    address: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn issue(&self, address: &str) -> (String, DateTime<Utc>) {
        let challenge = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + ChronoDuration::seconds(CHALLENGE_TTL_SECONDS);

        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            challenge.clone(),
            Challenge {
                address: address.to_string(),
                expires_at,
                used: false,
            },
        );
        (challenge, expires_at)
    }

    async fn consume(&self, challenge: &str, address: &str) -> Result<(), &'static str> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(challenge).ok_or("challenge not found")?;
        if entry.used || Utc::now() > entry.expires_at {
            return Err("challenge expired or used");
        }
        if entry.address != address {
            return Err("address mismatch");
        }
        entry.used = true;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthChallengeRequest {
    pub address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthChallengeResponse {
    pub challenge: String,
    pub expires_at: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthVerifyRequest {
    pub address: String,
    pub challenge: String,
    /// Compact ECDSA signature over sha256(challenge), hex-encoded.
    pub signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthVerifyResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub address: String,
}

#[derive(Clone)]
pub(crate) struct AuthContext {
    pub address: String,
}

pub(crate) async fn auth_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AuthChallengeRequest>,
) -> ApiResult<Json<AuthChallengeResponse>> {
    enforce_rate_limit(&state, "auth", &headers, state.rate_limits.auth_per_minute).await?;

    if parse_address(&payload.address).is_err() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_ADDRESS",
            "Address must be a hex-encoded compressed secp256k1 public key",
        ));
    }

    let (challenge, expires_at) = state.challenges.issue(&payload.address).await;
    Ok(Json(AuthChallengeResponse {
        challenge,
        expires_at: expires_at.timestamp(),
    }))
}

pub(crate) async fn auth_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AuthVerifyRequest>,
) -> ApiResult<Json<AuthVerifyResponse>> {
    enforce_rate_limit(&state, "auth", &headers, state.rate_limits.auth_per_minute).await?;

    if verify_signature(&payload.address, &payload.challenge, &payload.signature).is_err() {
        metrics::inc_auth_failure(crate::SERVICE_NAME);
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_FAILED",
            "Signature verification failed",
        ));
    }

    if let Err(reason) = state
        .challenges
        .consume(&payload.challenge, &payload.address)
        .await
    {
        metrics::inc_auth_failure(crate::SERVICE_NAME);
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "AUTH_FAILED", reason));
    }

    let (token, claims) = auth::issue_token(&payload.address, &state.jwt_config).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AUTH_ERROR",
            err.to_string(),
        )
    })?;
    metrics::inc_auth_success(crate::SERVICE_NAME);

    Ok(Json(AuthVerifyResponse {
        access_token: token,
        token_type: "Bearer",
        expires_at: claims.exp as i64,
        address: payload.address,
    }))
}

/// Extract and verify the bearer token; the subject is the acting address.
pub(crate) fn require_auth(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthContext> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| auth_required_error("missing token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| auth_required_error("invalid token"))?;
    let claims = auth::verify_token(token, &state.jwt_config)
        .map_err(|err| auth_required_error(err.to_string()))?;
    Ok(AuthContext {
        address: claims.sub,
    })
}

fn auth_required_error(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", message)
}

fn parse_address(address: &str) -> Result<PublicKey, ()> {
    let bytes = hex::decode(address).map_err(|_| ())?;
    PublicKey::from_slice(&bytes).map_err(|_| ())
}

fn verify_signature(address: &str, challenge: &str, signature_hex: &str) -> Result<(), ()> {
    let pubkey = parse_address(address)?;
    let signature_bytes = hex::decode(signature_hex).map_err(|_| ())?;
    let signature = Signature::from_compact(&signature_bytes).map_err(|_| ())?;

    let digest: [u8; 32] = Sha256::digest(challenge.as_bytes()).into();
    let message = Message::from_digest(digest);

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, &pubkey)
        .map_err(|_| ())
}

/// Rate-limit key for the caller. Deployments sit behind a proxy, so the
/// first `x-forwarded-for` hop wins; direct local traffic shares one bucket.
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

pub(crate) async fn enforce_rate_limit(
    state: &AppState,
    scope: &'static str,
    headers: &HeaderMap,
    limit: u64,
) -> ApiResult<()> {
    if !state.rate_limits.enabled {
        return Ok(());
    }

    let key = format!("{scope}:{}", client_key(headers));
    let decision = state
        .rate_limiter
        .check(&key, limit, Duration::from_secs(60))
        .await;
    if decision.allowed {
        return Ok(());
    }

    metrics::inc_rate_limited(crate::SERVICE_NAME, scope);
    Err(ApiError::new(
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMITED",
        "Too many requests, please try again later",
    )
    .with_details(serde_json::json!({
        "retryAfterSeconds": decision.retry_after.map(|d| d.as_secs()).unwrap_or(60),
    })))
}
