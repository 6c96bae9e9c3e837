use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bm_chain::{Explorer, RpcClient};
use bm_core::auth::JwtConfig;
use bm_core::rate_limit::RateLimiter;
use bm_pinning::{PinningError, PinningService};
use bm_store::{MarketStore, MemoryStore, NewNft};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::{auth, router, AppState, RateLimitConfig, StoreStatsProvider};

struct StubPinning {
    pins: Mutex<u32>,
}

#[async_trait::async_trait]
impl PinningService for StubPinning {
    async fn pin_file(&self, _bytes: Vec<u8>, _filename: &str) -> Result<String, PinningError> {
        let mut pins = self.pins.lock().await;
        *pins += 1;
        Ok(format!("QmStubFile{}", *pins))
    }

    async fn pin_json(&self, _value: &Value) -> Result<String, PinningError> {
        let mut pins = self.pins.lock().await;
        *pins += 1;
        Ok(format!("QmStubJson{}", *pins))
    }

    async fn pin_by_hash(&self, _cid: &str) -> Result<(), PinningError> {
        Ok(())
    }

    fn gateway_url(&self, cid: &str) -> String {
        format!("https://gateway.test/ipfs/{cid}")
    }
}

fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "bitmarket-node".to_string(),
        audience: "bm-market-api".to_string(),
        secret: "contract-test-secret".to_string(),
        ttl_seconds: 3600,
    }
}

fn test_state() -> (AppState, Arc<MemoryStore>) {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn MarketStore> = memory.clone();
    let state = AppState {
        stats: Arc::new(StoreStatsProvider::new(Arc::clone(&store))),
        store,
        pinning: Arc::new(StubPinning {
            pins: Mutex::new(0),
        }),
        // Unreachable on purpose; chain-backed routes must degrade, and
        // nothing else may touch the network.
        rpc: Arc::new(RpcClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap()),
        explorer: Explorer::new("https://basescan.org"),
        rate_limiter: Arc::new(RateLimiter::new()),
        rate_limits: RateLimitConfig {
            enabled: false,
            per_minute: 120,
            upload_per_minute: 10,
            auth_per_minute: 30,
        },
        jwt_config: jwt_config(),
        challenges: Arc::new(auth::ChallengeStore::new()),
        network: "testnet".to_string(),
    };
    (state, memory)
}

fn app(state: &AppState) -> Router {
    router(state.clone())
}

fn token_for(address: &str) -> String {
    let (token, _) = bm_core::auth::issue_token(address, &jwt_config()).unwrap();
    token
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let payload: Value = serde_json::from_slice(&body).expect("json body");
    (status, payload)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    read_json(response).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    payload: Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(payload.to_string()))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    read_json(response).await
}

async fn seed_nft(store: &MemoryStore, creator: &str) -> u64 {
    store
        .insert_nft(NewNft {
            name: "Seeded Piece".to_string(),
            description: "seeded".to_string(),
            image: "https://gateway.test/ipfs/QmSeed".to_string(),
            image_hash: "seedhash".to_string(),
            category: Some("art".to_string()),
            royalty_percentage: 5.0,
            creator: creator.to_string(),
            metadata_hash: "QmSeedMeta".to_string(),
            metadata_uri: "https://gateway.test/ipfs/QmSeedMeta".to_string(),
        })
        .await
        .id
}

const BOUNDARY: &str = "bm-contract-test-boundary";

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imageFile\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_multipart(
    app: Router,
    uri: &str,
    body: Vec<u8>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri).header(
        "content-type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body)).expect("request");
    let response = app.oneshot(request).await.expect("response");
    read_json(response).await
}

#[tokio::test]
async fn healthz_reports_ok_and_network() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["network"], "testnet");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn create_listing_returns_active_with_future_expiry() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 5 }),
        Some(&token_for("02seller")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["success"], true);
    let listing = &payload["listing"];
    assert_eq!(listing["status"], "active");
    assert_eq!(listing["seller"], "02seller");

    let listed_at: chrono::DateTime<chrono::Utc> =
        listing["listedAt"].as_str().unwrap().parse().unwrap();
    let expires_at: chrono::DateTime<chrono::Utc> =
        listing["expiresAt"].as_str().unwrap().parse().unwrap();
    assert!(expires_at > listed_at);
}

#[tokio::test]
async fn listing_creation_requires_auth() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0 }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn listing_creation_rejects_missing_fields_and_bad_price() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;
    let token = token_for("02seller");

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "price": 2.0 }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "MISSING_FIELDS");

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 0.0 }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_PRICE");

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": 999, "price": 2.0 }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], "NFT_NOT_FOUND");
}

#[tokio::test]
async fn buy_follows_the_worked_fee_example() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 5 }),
        Some(&token_for("02seller")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 2 }),
        Some(&token_for("02buyer")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let tx = &payload["transaction"];
    assert_eq!(tx["totalPrice"], 4.0);
    assert_eq!(tx["platformFee"], 0.0);
    assert_eq!(tx["sellerAmount"], 4.0);
    assert_eq!(tx["buyer"], "02buyer");
    assert_eq!(tx["status"], "pending");

    let (_, fetched) = get_json(
        app(&state),
        &format!("/api/marketplace/listings/{listing_id}"),
    )
    .await;
    assert_eq!(fetched["listing"]["quantity"], 3);
    assert_eq!(fetched["listing"]["status"], "active");

    // Draining the remaining quantity flips the listing to sold.
    let (status, _) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 3 }),
        Some(&token_for("02buyer")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, fetched) = get_json(
        app(&state),
        &format!("/api/marketplace/listings/{listing_id}"),
    )
    .await;
    assert_eq!(fetched["listing"]["quantity"], 0);
    assert_eq!(fetched["listing"]["status"], "sold");

    // A sold listing reads as unavailable to further buyers.
    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 1 }),
        Some(&token_for("02buyer")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], "LISTING_NOT_FOUND");
}

#[tokio::test]
async fn buy_rejects_oversell_without_mutating() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 5 }),
        Some(&token_for("02seller")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 6 }),
        Some(&token_for("02buyer")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INSUFFICIENT_QUANTITY");
    assert_eq!(payload["details"]["available"], 5);

    let (_, fetched) = get_json(
        app(&state),
        &format!("/api/marketplace/listings/{listing_id}"),
    )
    .await;
    assert_eq!(fetched["listing"]["quantity"], 5);
}

#[tokio::test]
async fn non_seller_update_and_cancel_are_forbidden() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0 }),
        Some(&token_for("02seller")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();
    let uri = format!("/api/marketplace/listings/{listing_id}");

    let (status, payload) = send_json(
        app(&state),
        Method::PUT,
        &uri,
        json!({ "price": 9.0 }),
        Some(&token_for("02mallory")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], "NOT_SELLER");

    let (status, _) = send_json(
        app(&state),
        Method::DELETE,
        &uri,
        json!({}),
        Some(&token_for("02mallory")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The listing is untouched.
    let (_, fetched) = get_json(app(&state), &uri).await;
    assert_eq!(fetched["listing"]["price"], 2.0);
    assert_eq!(fetched["listing"]["status"], "active");
}

#[tokio::test]
async fn seller_updates_price_and_cancels() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;
    let token = token_for("02seller");

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0 }),
        Some(&token),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();
    let uri = format!("/api/marketplace/listings/{listing_id}");

    let (status, payload) = send_json(
        app(&state),
        Method::PUT,
        &uri,
        json!({ "price": 3.5 }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["listing"]["price"], 3.5);

    let (status, payload) =
        send_json(app(&state), Method::DELETE, &uri, json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["message"], "Listing cancelled successfully");

    let (_, fetched) = get_json(app(&state), &uri).await;
    assert_eq!(fetched["listing"]["status"], "cancelled");
}

#[tokio::test]
async fn listings_index_filters_sorts_and_paginates() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02seller").await;
    let token = token_for("02seller");

    for price in [5.0, 1.0, 3.0] {
        send_json(
            app(&state),
            Method::POST,
            "/api/marketplace/listings",
            json!({ "nftId": nft_id, "price": price }),
            Some(&token),
        )
        .await;
    }

    let (_, payload) = get_json(app(&state), "/api/marketplace/listings?sortBy=price").await;
    let prices: Vec<f64> = payload["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|listing| listing["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![1.0, 3.0, 5.0]);

    let (_, payload) = get_json(
        app(&state),
        "/api/marketplace/listings?sortBy=price&order=desc",
    )
    .await;
    assert_eq!(payload["listings"][0]["price"], 5.0);

    let (_, payload) = get_json(
        app(&state),
        "/api/marketplace/listings?minPrice=2&maxPrice=4",
    )
    .await;
    assert_eq!(payload["listings"].as_array().unwrap().len(), 1);
    assert_eq!(payload["listings"][0]["price"], 3.0);

    let (_, payload) = get_json(app(&state), "/api/marketplace/listings?limit=2&page=1").await;
    assert_eq!(payload["listings"].as_array().unwrap().len(), 2);
    assert_eq!(payload["pagination"]["total"], 3);
    assert_eq!(payload["pagination"]["pages"], 2);
}

#[tokio::test]
async fn nft_creation_rejects_out_of_range_royalty() {
    let (state, _) = test_state();
    let body = multipart_body(
        &[
            ("name", "Test"),
            ("description", "desc"),
            ("royaltyPercentage", "30"),
        ],
        Some(("art.png", "image/png", b"png-bytes")),
    );
    let (status, payload) =
        post_multipart(app(&state), "/api/nfts", body, Some(&token_for("02creator"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_ROYALTY");
}

#[tokio::test]
async fn nft_creation_pins_image_and_metadata() {
    let (state, _) = test_state();
    let body = multipart_body(
        &[
            ("name", "Test Piece"),
            ("description", "A test piece"),
            ("category", "art"),
            ("royaltyPercentage", "5"),
        ],
        Some(("art.png", "image/png", b"png-bytes")),
    );
    let (status, payload) =
        post_multipart(app(&state), "/api/nfts", body, Some(&token_for("02creator"))).await;

    assert_eq!(status, StatusCode::CREATED);
    let nft = &payload["nft"];
    assert_eq!(nft["id"], 1);
    assert_eq!(nft["name"], "Test Piece");
    assert_eq!(nft["creator"], "02creator");
    assert_eq!(nft["owner"], "02creator");
    assert_eq!(nft["royaltyPercentage"], 5.0);
    assert_eq!(
        nft["image"],
        "https://gateway.test/ipfs/QmStubFile1"
    );
    assert_eq!(
        nft["metadataUri"],
        "https://gateway.test/ipfs/QmStubJson2"
    );
    assert_eq!(nft["imageHash"], bm_pinning::sha256_hex(b"png-bytes"));
}

#[tokio::test]
async fn nft_creation_rejects_non_image_uploads() {
    let (state, _) = test_state();
    let body = multipart_body(
        &[
            ("name", "Test"),
            ("description", "desc"),
            ("royaltyPercentage", "5"),
        ],
        Some(("doc.pdf", "application/pdf", b"%PDF")),
    );
    let (status, payload) =
        post_multipart(app(&state), "/api/nfts", body, Some(&token_for("02creator"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_FILE_TYPE");
}

#[tokio::test]
async fn nft_creation_requires_all_fields() {
    let (state, _) = test_state();
    let body = multipart_body(
        &[("name", "Test"), ("royaltyPercentage", "5")],
        Some(("art.png", "image/png", b"png-bytes")),
    );
    let (status, payload) =
        post_multipart(app(&state), "/api/nfts", body, Some(&token_for("02creator"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "MISSING_FIELDS");
}

#[tokio::test]
async fn nft_detail_and_history_track_sales() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02creator").await;

    let (status, payload) = get_json(app(&state), &format!("/api/nfts/{nft_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["nft"]["id"], nft_id);

    let (status, payload) = get_json(app(&state), "/api/nfts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], "NFT_NOT_FOUND");

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 2 }),
        Some(&token_for("02creator")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();
    send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 1 }),
        Some(&token_for("02buyer")),
    )
    .await;

    let (_, payload) = get_json(app(&state), &format!("/api/nfts/{nft_id}/history")).await;
    let history = payload["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["type"], "created");
    assert_eq!(history[1]["type"], "sale");
    assert_eq!(history[1]["to"], "02buyer");
    assert_eq!(history[1]["price"], 2.0);
}

#[tokio::test]
async fn categories_are_fixed() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/api/nfts/meta/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["categories"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn profile_is_lazily_defaulted_and_self_updatable() {
    let (state, _) = test_state();

    let (status, payload) = get_json(app(&state), "/api/users/02someone").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["user"]["bio"], "");
    assert_eq!(payload["user"]["stats"]["nftsCreated"], 0);
    assert_eq!(payload["user"]["verified"], false);

    let (status, payload) = send_json(
        app(&state),
        Method::PUT,
        "/api/users/02someone",
        json!({ "bio": "digital artist", "social": { "twitter": "@someone" } }),
        Some(&token_for("02someone")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["user"]["bio"], "digital artist");
    assert_eq!(payload["user"]["social"]["twitter"], "@someone");

    // Another identity cannot touch the profile.
    let (status, payload) = send_json(
        app(&state),
        Method::PUT,
        "/api/users/02someone",
        json!({ "bio": "defaced" }),
        Some(&token_for("02other")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], "FORBIDDEN");
}

#[tokio::test]
async fn user_stats_and_sales_reflect_activity() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02creator").await;

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 2 }),
        Some(&token_for("02creator")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();
    send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id }),
        Some(&token_for("02buyer")),
    )
    .await;

    let (_, payload) = get_json(app(&state), "/api/users/02creator").await;
    assert_eq!(payload["user"]["stats"]["nftsCreated"], 1);
    assert_eq!(payload["user"]["stats"]["nftsOwned"], 1);
    assert_eq!(payload["user"]["stats"]["totalSales"], 1);

    let (_, payload) = get_json(app(&state), "/api/users/02creator/sales").await;
    assert_eq!(payload["sales"].as_array().unwrap().len(), 1);
    assert_eq!(payload["sales"][0]["buyer"], "02buyer");

    let (_, payload) = get_json(app(&state), "/api/users/02creator/nfts").await;
    assert_eq!(payload["nfts"].as_array().unwrap().len(), 1);
    assert_eq!(payload["pagination"]["total"], 1);
}

#[tokio::test]
async fn analytics_stats_reflect_purchases() {
    let (state, store) = test_state();
    let nft_id = seed_nft(&store, "02creator").await;

    let (_, created) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 2.0, "quantity": 5 }),
        Some(&token_for("02creator")),
    )
    .await;
    let listing_id = created["listing"]["id"].as_u64().unwrap();
    send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/buy",
        json!({ "listingId": listing_id, "quantity": 2 }),
        Some(&token_for("02buyer")),
    )
    .await;

    let (status, payload) = get_json(app(&state), "/api/analytics/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats = &payload["stats"];
    assert_eq!(stats["totalVolume"], 4.0);
    assert_eq!(stats["totalSales"], 1);
    assert_eq!(stats["activeListings"], 1);
    assert_eq!(stats["uniqueBuyers"], 1);

    let (_, payload) = get_json(app(&state), "/api/analytics/top-creators").await;
    assert_eq!(payload["creators"][0]["address"], "02creator");

    let (_, payload) = get_json(app(&state), "/api/analytics/top-buyers").await;
    assert_eq!(payload["buyers"][0]["address"], "02buyer");

    let (_, payload) = get_json(app(&state), "/api/analytics/trending").await;
    assert_eq!(payload["nfts"][0]["id"], nft_id);
}

#[tokio::test]
async fn signature_auth_flow_issues_usable_token() {
    use secp256k1::{Message, Secp256k1};
    use sha2::{Digest, Sha256};

    let secp = Secp256k1::new();
    let (secret_key, public_key) = secp.generate_keypair(&mut secp256k1::rand::thread_rng());
    let address = hex::encode(public_key.serialize());

    let (state, store) = test_state();
    let nft_id = seed_nft(&store, &address).await;

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/auth/challenge",
        json!({ "address": address }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let challenge = payload["challenge"].as_str().unwrap().to_string();

    let digest: [u8; 32] = Sha256::digest(challenge.as_bytes()).into();
    let signature = secp.sign_ecdsa(&Message::from_digest(digest), &secret_key);

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/auth/verify",
        json!({
            "address": address,
            "challenge": challenge,
            "signature": hex::encode(signature.serialize_compact()),
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["tokenType"], "Bearer");
    let token = payload["accessToken"].as_str().unwrap().to_string();

    // The issued token authorizes market mutations for that address.
    let (status, _) = send_json(
        app(&state),
        Method::POST,
        "/api/marketplace/listings",
        json!({ "nftId": nft_id, "price": 1.0 }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Challenges are single use.
    let (status, _) = send_json(
        app(&state),
        Method::POST,
        "/api/auth/verify",
        json!({
            "address": address,
            "challenge": challenge,
            "signature": hex::encode(signature.serialize_compact()),
        }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let (state, _) = test_state();
    let secp = secp256k1::Secp256k1::new();
    let (_, public_key) = secp.generate_keypair(&mut secp256k1::rand::thread_rng());
    let address = hex::encode(public_key.serialize());

    let (_, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/auth/challenge",
        json!({ "address": address }),
        None,
    )
    .await;
    let challenge = payload["challenge"].as_str().unwrap().to_string();

    let (status, payload) = send_json(
        app(&state),
        Method::POST,
        "/api/auth/verify",
        json!({ "address": address, "challenge": challenge, "signature": "00" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn gas_endpoint_degrades_to_fallback_estimate() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/api/base/gas?price=10&royalty=5").await;
    assert_eq!(status, StatusCode::OK);

    // RPC is unreachable in tests, so the fallback numbers apply.
    assert_eq!(payload["estimate"]["gasLimit"], 21000);
    assert_eq!(payload["estimate"]["gasPriceGwei"], 0.1);

    let breakdown = &payload["breakdown"];
    assert_eq!(breakdown["platformFee"], 0.25);
    assert_eq!(breakdown["royaltyFee"], 0.5);
    assert_eq!(breakdown["isCheapGas"], true);
}

#[tokio::test]
async fn base_account_validates_address_format() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/api/base/account/not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn base_health_surfaces_rpc_outage() {
    let (state, _) = test_state();
    let (status, payload) = get_json(app(&state), "/api/base/health").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(payload["code"], "RPC_ERROR");
}
