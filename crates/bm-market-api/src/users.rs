use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bm_store::{Nft, NftFilter, ProfileUpdate, SaleRecord, UserProfile};
use serde::{Deserialize, Serialize};

use crate::auth::require_auth;
use crate::pagination::{paginate, PageInfo, PageQuery};
use crate::{ApiError, ApiResult, AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    pub success: bool,
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserNftsResponse {
    pub success: bool,
    pub nfts: Vec<Nft>,
    pub pagination: PageInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserSalesResponse {
    pub success: bool,
    pub sales: Vec<SaleRecord>,
    pub pagination: PageInfo,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateUserRequest {
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub social: Option<SocialUpdate>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SocialUpdate {
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

/// Creation/ownership/sales counters are derived from the store at read time;
/// only followers/following live on the stored profile.
async fn with_live_stats(state: &AppState, mut profile: UserProfile) -> UserProfile {
    let address = profile.address.clone();
    profile.stats.nfts_created = state
        .store
        .nfts(NftFilter {
            creator: Some(address.clone()),
            ..NftFilter::default()
        })
        .await
        .len() as u64;
    profile.stats.nfts_owned = state
        .store
        .nfts(NftFilter {
            owner: Some(address.clone()),
            ..NftFilter::default()
        })
        .await
        .len() as u64;
    profile.stats.total_sales = state.store.sales_by_seller(&address).await.len() as u64;
    profile
}

pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let profile = state.store.profile(&address).await;
    let user = with_live_stats(&state, profile).await;
    Ok(Json(UserResponse {
        success: true,
        user,
        message: None,
    }))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let caller = require_auth(&state, &headers)?;
    if caller.address != address {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Cannot update another user's profile",
        ));
    }

    let social = payload.social.unwrap_or_default();
    let profile = state
        .store
        .update_profile(
            &address,
            ProfileUpdate {
                bio: payload.bio,
                avatar: payload.avatar,
                banner: payload.banner,
                twitter: social.twitter,
                instagram: social.instagram,
                website: social.website,
            },
        )
        .await;

    let user = with_live_stats(&state, profile).await;
    Ok(Json(UserResponse {
        success: true,
        user,
        message: Some("Profile updated successfully"),
    }))
}

pub(crate) async fn user_nfts(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Json<UserNftsResponse>> {
    let mut nfts = state
        .store
        .nfts(NftFilter {
            owner: Some(address),
            ..NftFilter::default()
        })
        .await;
    nfts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let (nfts, pagination) = paginate(nfts, &page_query);
    Ok(Json(UserNftsResponse {
        success: true,
        nfts,
        pagination,
    }))
}

pub(crate) async fn user_sales(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(page_query): Query<PageQuery>,
) -> ApiResult<Json<UserSalesResponse>> {
    let mut sales = state.store.sales_by_seller(&address).await;
    sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let (sales, pagination) = paginate(sales, &page_query);
    Ok(Json(UserSalesResponse {
        success: true,
        sales,
        pagination,
    }))
}
