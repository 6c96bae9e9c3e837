//! REST API for the BitMarket NFT storefront: NFT creation and browsing,
//! marketplace listings and purchases, user profiles, analytics, and chain
//! lookups.

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bm_chain::{Explorer, RpcClient};
use bm_core::auth::JwtConfig;
use bm_core::rate_limit::RateLimiter;
use bm_core::{config, http, logging, metrics, server};
use bm_pinning::{HttpPinningClient, PinningConfig, PinningService};
use bm_store::{MarketStore, MemoryStore, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod analytics;
mod auth;
mod chain;
mod listings;
mod nfts;
mod openapi;
mod pagination;
mod users;

#[cfg(test)]
mod contract_tests;

pub use analytics::{StatsProvider, StoreStatsProvider};

const SERVICE_NAME: &str = "bm-market-api";

/// Whole multipart upload, including the 10 MiB image and form fields.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

#[derive(Clone, Copy)]
pub(crate) struct RateLimitConfig {
    pub enabled: bool,
    pub per_minute: u64,
    pub upload_per_minute: u64,
    pub auth_per_minute: u64,
}

#[derive(Clone)]
pub(crate) struct AppState {
    store: Arc<dyn MarketStore>,
    stats: Arc<dyn StatsProvider>,
    pinning: Arc<dyn PinningService>,
    rpc: Arc<RpcClient>,
    explorer: Explorer,
    rate_limiter: Arc<RateLimiter>,
    rate_limits: RateLimitConfig,
    jwt_config: JwtConfig,
    challenges: Arc<auth::ChallengeStore>,
    network: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub(crate) struct ErrorResponse {
    #[schema(value_type = String)]
    code: &'static str,
    message: String,
    #[schema(value_type = Object)]
    details: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NftNotFound => {
                ApiError::new(StatusCode::NOT_FOUND, "NFT_NOT_FOUND", "NFT not found")
            }
            StoreError::ListingNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "LISTING_NOT_FOUND",
                "Listing not found",
            ),
            StoreError::ListingInactive => ApiError::new(
                StatusCode::BAD_REQUEST,
                "LISTING_INACTIVE",
                "Listing is not active",
            ),
            StoreError::InsufficientQuantity {
                requested,
                available,
            } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_QUANTITY",
                "Insufficient quantity available",
            )
            .with_details(serde_json::json!({
                "requested": requested,
                "available": available,
            })),
            StoreError::NotSeller => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_SELLER",
                "Caller is not the seller of this listing",
            ),
            StoreError::InvalidPrice => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_PRICE",
                "Price must be greater than 0",
            ),
            StoreError::InvalidQuantity => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_QUANTITY",
                "Quantity must be greater than 0",
            ),
        }
    }
}

impl From<bm_chain::RpcError> for ApiError {
    fn from(err: bm_chain::RpcError) -> Self {
        ApiError::new(StatusCode::BAD_GATEWAY, "RPC_ERROR", err.to_string())
    }
}

impl From<bm_pinning::PinningError> for ApiError {
    fn from(err: bm_pinning::PinningError) -> Self {
        ApiError::new(StatusCode::BAD_GATEWAY, "PINNING_ERROR", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(payload)).into_response()
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct HealthStatus {
    status: String,
    network: String,
}

pub struct MarketApiConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub network: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub pinning: PinningConfig,
    pub jwt: JwtConfig,
    pub rate_limits_enabled: bool,
    pub requests_per_minute: u64,
    pub uploads_per_minute: u64,
    pub auth_per_minute: u64,
}

pub fn load_config() -> Result<MarketApiConfig> {
    let addr = config::socket_addr_from_env("MARKET_API_ADDR", "0.0.0.0:3001")?;
    let allowed_origins = config::list_from_env("ALLOWED_ORIGINS", "http://localhost:5173");
    let network = config::optional_env("NETWORK", "testnet");

    let rpc_url = config::optional_env("BASE_RPC_URL", "https://mainnet.base.org");
    let explorer_url = config::optional_env("EXPLORER_URL", "https://basescan.org");

    let pinning = PinningConfig {
        api_url: config::optional_env("PINATA_API_URL", "https://api.pinata.cloud"),
        jwt: config::required_env("PINATA_JWT")?,
        gateway: config::required_env("PINATA_GATEWAY")?,
    };

    let jwt = JwtConfig {
        issuer: "bitmarket-node".to_string(),
        audience: SERVICE_NAME.to_string(),
        secret: config::required_env("API_SECRET_KEY")?,
        ttl_seconds: config::u64_from_env("TOKEN_TTL_SECONDS", 3600),
    };

    Ok(MarketApiConfig {
        addr,
        allowed_origins,
        network,
        rpc_url,
        explorer_url,
        pinning,
        jwt,
        rate_limits_enabled: config::optional_env("RATE_LIMITS_ENABLED", "true") == "true",
        requests_per_minute: config::u64_from_env("RATE_LIMIT_PER_MINUTE", 120),
        uploads_per_minute: config::u64_from_env("UPLOAD_LIMIT_PER_MINUTE", 10),
        auth_per_minute: config::u64_from_env("AUTH_LIMIT_PER_MINUTE", 30),
    })
}

pub async fn run(config: MarketApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    metrics::init(SERVICE_NAME);

    let store: Arc<dyn MarketStore> = Arc::new(MemoryStore::new());
    let stats = Arc::new(StoreStatsProvider::new(Arc::clone(&store)));
    let pinning: Arc<dyn PinningService> = Arc::new(HttpPinningClient::new(config.pinning)?);
    let rpc = Arc::new(RpcClient::new(config.rpc_url, Duration::from_secs(10))?);

    let state = AppState {
        store,
        stats,
        pinning,
        rpc,
        explorer: Explorer::new(config.explorer_url),
        rate_limiter: Arc::new(RateLimiter::new()),
        rate_limits: RateLimitConfig {
            enabled: config.rate_limits_enabled,
            per_minute: config.requests_per_minute,
            upload_per_minute: config.uploads_per_minute,
            auth_per_minute: config.auth_per_minute,
        },
        jwt_config: config.jwt,
        challenges: Arc::new(auth::ChallengeStore::new()),
        network: config.network,
    };

    let router = router(state)
        .layer(http::cors_layer(&config.allowed_origins));
    let router =
        http::apply_standard_layers_with_body_limit(router, SERVICE_NAME, UPLOAD_BODY_LIMIT);
    server::serve(config.addr, router).await
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/health", get(healthz))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/auth/challenge", post(auth::auth_challenge))
        .route("/api/auth/verify", post(auth::auth_verify))
        .route("/api/nfts", post(nfts::create_nft).get(nfts::list_nfts))
        .route("/api/nfts/meta/categories", get(nfts::categories))
        .route("/api/nfts/:id", get(nfts::get_nft))
        .route("/api/nfts/:id/history", get(nfts::nft_history))
        .route(
            "/api/marketplace/listings",
            post(listings::create_listing).get(listings::list_listings),
        )
        .route(
            "/api/marketplace/listings/:id",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::cancel_listing),
        )
        .route("/api/marketplace/buy", post(listings::buy))
        .route(
            "/api/users/:address",
            get(users::get_user).put(users::update_user),
        )
        .route("/api/users/:address/nfts", get(users::user_nfts))
        .route("/api/users/:address/sales", get(users::user_sales))
        .route("/api/analytics/stats", get(analytics::stats))
        .route("/api/analytics/top-creators", get(analytics::top_creators))
        .route("/api/analytics/top-buyers", get(analytics::top_buyers))
        .route("/api/analytics/trending", get(analytics::trending))
        .route("/api/base/health", get(chain::base_health))
        .route("/api/base/account/:address", get(chain::base_account))
        .route("/api/base/gas", get(chain::base_gas))
        .route("/api/base/tx/:hash", get(chain::base_tx))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}

async fn healthz(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok".into(),
            network: state.network.clone(),
        }),
    )
}

async fn metrics_endpoint() -> impl IntoResponse {
    metrics::metrics_response(SERVICE_NAME)
}

async fn openapi_json(headers: axum::http::HeaderMap) -> impl IntoResponse {
    let server_url = openapi::infer_server_url(&headers);
    Json(openapi::document(server_url.as_deref()))
}

async fn not_found(request: axum::extract::Request) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "ROUTE_NOT_FOUND",
        format!("Route {} {} not found", request.method(), request.uri().path()),
    )
}
