#![allow(dead_code)]

use axum::http::HeaderMap;
use utoipa::openapi::server::ServerBuilder;
use utoipa::OpenApi;

use crate::{ErrorResponse, HealthStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz_doc,
        metrics_doc,
        auth_challenge_doc,
        auth_verify_doc,
        nfts_list_doc,
        nft_create_doc,
        listings_list_doc,
        listing_create_doc,
        buy_doc,
        user_doc,
        stats_doc,
        base_account_doc
    ),
    components(schemas(HealthStatus, ErrorResponse)),
    tags(
        (name = "market-api", description = "BitMarket storefront API")
    )
)]
pub struct MarketApiDoc;

pub fn document(server_url: Option<&str>) -> utoipa::openapi::OpenApi {
    let mut doc = MarketApiDoc::openapi();
    if let Some(url) = server_url {
        doc.servers = Some(vec![ServerBuilder::new().url(url).build()]);
    }
    doc
}

pub fn infer_server_url(headers: &HeaderMap) -> Option<String> {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|value| value.to_str().ok())?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    Some(format!("{proto}://{host}"))
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, body = HealthStatus))
)]
fn healthz_doc() {}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, content_type = "text/plain", body = String))
)]
fn metrics_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/challenge",
    responses(
        (status = 200, description = "Challenge issued"),
        (status = 400, body = ErrorResponse)
    )
)]
fn auth_challenge_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Bearer token issued"),
        (status = 401, body = ErrorResponse)
    )
)]
fn auth_verify_doc() {}

#[utoipa::path(
    get,
    path = "/api/nfts",
    responses((status = 200, description = "Paginated NFT list"))
)]
fn nfts_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/nfts",
    responses(
        (status = 201, description = "NFT created"),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse)
    )
)]
fn nft_create_doc() {}

#[utoipa::path(
    get,
    path = "/api/marketplace/listings",
    responses((status = 200, description = "Paginated active listings"))
)]
fn listings_list_doc() {}

#[utoipa::path(
    post,
    path = "/api/marketplace/listings",
    responses(
        (status = 201, description = "Listing created"),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn listing_create_doc() {}

#[utoipa::path(
    post,
    path = "/api/marketplace/buy",
    responses(
        (status = 201, description = "Purchase receipt"),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn buy_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/{address}",
    responses((status = 200, description = "User profile"))
)]
fn user_doc() {}

#[utoipa::path(
    get,
    path = "/api/analytics/stats",
    responses((status = 200, description = "Marketplace aggregates"))
)]
fn stats_doc() {}

#[utoipa::path(
    get,
    path = "/api/base/account/{address}",
    responses(
        (status = 200, description = "Native balance"),
        (status = 400, body = ErrorResponse),
        (status = 502, body = ErrorResponse)
    )
)]
fn base_account_doc() {}
