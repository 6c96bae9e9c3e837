use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bm_core::metrics;
use bm_store::{Listing, ListingFilter, NewListing, SaleRecord, StoreError};
use serde::{Deserialize, Serialize};

use crate::auth::{enforce_rate_limit, require_auth};
use crate::pagination::{paginate, PageInfo, PageQuery};
use crate::{ApiError, ApiResult, AppState};

const DEFAULT_LISTING_DURATION_SECONDS: u64 = 2_592_000; // 30 days

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateListingRequest {
    pub nft_id: Option<u64>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    /// Listing lifetime in seconds.
    pub duration: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListingsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateListingRequest {
    pub price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuyRequest {
    pub listing_id: Option<u64>,
    pub quantity: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListingResponse {
    pub success: bool,
    pub listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListingsResponse {
    pub success: bool,
    pub listings: Vec<Listing>,
    pub pagination: PageInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuyResponse {
    pub success: bool,
    pub transaction: SaleRecord,
    pub message: &'static str,
}

pub(crate) async fn create_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateListingRequest>,
) -> ApiResult<(StatusCode, Json<ListingResponse>)> {
    let seller = require_auth(&state, &headers)?;
    enforce_rate_limit(&state, "api", &headers, state.rate_limits.per_minute).await?;

    let (Some(nft_id), Some(price)) = (payload.nft_id, payload.price) else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "Missing required fields: nftId, price",
        ));
    };

    let listing = state
        .store
        .insert_listing(NewListing {
            nft_id,
            seller: seller.address,
            price,
            quantity: payload.quantity.unwrap_or(1),
            duration_seconds: payload.duration.unwrap_or(DEFAULT_LISTING_DURATION_SECONDS),
        })
        .await?;

    metrics::inc_listing_created(crate::SERVICE_NAME);
    tracing::info!(listing_id = listing.id, nft_id, "listing created");

    Ok((
        StatusCode::CREATED,
        Json(ListingResponse {
            success: true,
            listing,
            message: Some("Listing created successfully"),
        }),
    ))
}

pub(crate) async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> ApiResult<Json<ListingsResponse>> {
    let mut listings = state
        .store
        .listings(ListingFilter {
            active_only: true,
            min_price: query.min_price,
            max_price: query.max_price,
            seller: None,
        })
        .await;

    let descending = query.order.as_deref() == Some("desc");
    match query.sort_by.as_deref() {
        Some("date") => {
            listings.sort_by(|a, b| a.listed_at.cmp(&b.listed_at));
        }
        // Price ordering is the default.
        _ => {
            listings.sort_by(|a, b| a.price.total_cmp(&b.price));
        }
    }
    if descending {
        listings.reverse();
    }

    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (listings, pagination) = paginate(listings, &page_query);

    Ok(Json(ListingsResponse {
        success: true,
        listings,
        pagination,
    }))
}

pub(crate) async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ListingResponse>> {
    let listing = state
        .store
        .listing(id)
        .await
        .ok_or(StoreError::ListingNotFound)?;
    Ok(Json(ListingResponse {
        success: true,
        listing,
        message: None,
    }))
}

pub(crate) async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateListingRequest>,
) -> ApiResult<Json<ListingResponse>> {
    let seller = require_auth(&state, &headers)?;

    let price = payload.price.ok_or_else(|| {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_PRICE", "Invalid price")
    })?;

    let listing = state
        .store
        .update_listing_price(id, &seller.address, price)
        .await?;

    Ok(Json(ListingResponse {
        success: true,
        listing,
        message: Some("Listing updated successfully"),
    }))
}

pub(crate) async fn cancel_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> ApiResult<Json<CancelResponse>> {
    let seller = require_auth(&state, &headers)?;
    state.store.cancel_listing(id, &seller.address).await?;

    Ok(Json(CancelResponse {
        success: true,
        message: "Listing cancelled successfully",
    }))
}

pub(crate) async fn buy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BuyRequest>,
) -> ApiResult<(StatusCode, Json<BuyResponse>)> {
    let buyer = require_auth(&state, &headers)?;
    enforce_rate_limit(&state, "api", &headers, state.rate_limits.per_minute).await?;

    let listing_id = payload.listing_id.ok_or_else(|| {
        ApiError::new(StatusCode::BAD_REQUEST, "MISSING_FIELDS", "Missing listingId")
    })?;
    let quantity = payload.quantity.unwrap_or(1);

    let sale = state
        .store
        .purchase(listing_id, &buyer.address, quantity)
        .await
        .map_err(|err| match err {
            // A cancelled or sold-out listing is indistinguishable from a
            // missing one to buyers.
            StoreError::ListingNotFound | StoreError::ListingInactive => {
                metrics::inc_purchase_rejected(crate::SERVICE_NAME, "unavailable");
                ApiError::new(
                    StatusCode::NOT_FOUND,
                    "LISTING_NOT_FOUND",
                    "Listing not found or inactive",
                )
            }
            StoreError::InsufficientQuantity { .. } => {
                metrics::inc_purchase_rejected(crate::SERVICE_NAME, "insufficient_quantity");
                ApiError::from(err)
            }
            other => {
                metrics::inc_purchase_rejected(crate::SERVICE_NAME, "invalid_request");
                ApiError::from(other)
            }
        })?;

    metrics::inc_purchase(crate::SERVICE_NAME);
    tracing::info!(
        listing_id,
        quantity,
        total_price = sale.total_price,
        "purchase recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(BuyResponse {
            success: true,
            transaction: sale,
            message: "Purchase initiated. Awaiting chain confirmation.",
        }),
    ))
}
