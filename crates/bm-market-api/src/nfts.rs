use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bm_core::metrics;
use bm_store::fees;
use bm_store::{NewNft, Nft, NftFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{enforce_rate_limit, require_auth};
use crate::pagination::{paginate, PageInfo, PageQuery};
use crate::{ApiError, ApiResult, AppState};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const CATEGORIES: [&str; 6] = [
    "art",
    "collectibles",
    "sports",
    "digital-items",
    "music",
    "video",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNftResponse {
    pub success: bool,
    pub nft: Nft,
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NftsResponse {
    pub success: bool,
    pub nfts: Vec<Nft>,
    pub pagination: PageInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NftResponse {
    pub success: bool,
    pub nft: Nft,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryEvent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NftsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
}

struct UploadForm {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    royalty_percentage: Option<String>,
    image: Option<UploadedImage>,
}

struct UploadedImage {
    bytes: Vec<u8>,
    filename: String,
    content_type: String,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm {
        name: None,
        description: None,
        category: None,
        royalty_percentage: None,
        image: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_MULTIPART", err.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "category" => form.category = Some(read_text(field).await?),
            "royaltyPercentage" => form.royalty_percentage = Some(read_text(field).await?),
            "imageFile" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::new(StatusCode::BAD_REQUEST, "INVALID_MULTIPART", err.to_string())
                })?;
                form.image = Some(UploadedImage {
                    bytes: bytes.to_vec(),
                    filename,
                    content_type,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field.text().await.map_err(|err| {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_MULTIPART", err.to_string())
    })
}

pub(crate) async fn create_nft(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CreateNftResponse>)> {
    let creator = require_auth(&state, &headers)?;
    enforce_rate_limit(
        &state,
        "upload",
        &headers,
        state.rate_limits.upload_per_minute,
    )
    .await?;

    let form = read_form(multipart).await?;

    let (Some(name), Some(description), Some(image)) =
        (form.name.clone(), form.description.clone(), form.image)
    else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "Missing required fields: name, description, imageFile",
        ));
    };

    if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_FILE_TYPE",
            "Invalid file type. Only images are allowed.",
        ));
    }
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "FILE_TOO_LARGE",
            "Image exceeds the 10MB upload limit",
        ));
    }

    let royalty = form
        .royalty_percentage
        .as_deref()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| fees::royalty_in_range(*value))
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ROYALTY",
                "Invalid royalty percentage. Must be between 0 and 25.",
            )
        })?;

    let image_hash = bm_pinning::sha256_hex(&image.bytes);
    let image_cid = state
        .pinning
        .pin_file(image.bytes, &image.filename)
        .await
        .map_err(|err| {
            metrics::inc_pinning_error(crate::SERVICE_NAME, "pin_file");
            ApiError::from(err)
        })?;
    let image_uri = state.pinning.gateway_url(&image_cid);

    let metadata = serde_json::json!({
        "name": name,
        "description": description,
        "image": image_uri,
        "imageHash": image_hash,
        "category": form.category.clone(),
        "royaltyPercentage": royalty,
        "creator": creator.address.clone(),
        "createdAt": Utc::now().to_rfc3339(),
    });
    let metadata_hash = state.pinning.pin_json(&metadata).await.map_err(|err| {
        metrics::inc_pinning_error(crate::SERVICE_NAME, "pin_json");
        ApiError::from(err)
    })?;
    let metadata_uri = state.pinning.gateway_url(&metadata_hash);

    let nft = state
        .store
        .insert_nft(NewNft {
            name,
            description,
            image: image_uri,
            image_hash,
            category: form.category,
            royalty_percentage: royalty,
            creator: creator.address,
            metadata_hash,
            metadata_uri,
        })
        .await;

    metrics::inc_nft_created(crate::SERVICE_NAME);
    tracing::info!(nft_id = nft.id, creator = %nft.creator, "nft created");

    Ok((
        StatusCode::CREATED,
        Json(CreateNftResponse {
            success: true,
            nft,
            message: "NFT created successfully. Ready to mint on chain.",
        }),
    ))
}

pub(crate) async fn list_nfts(
    State(state): State<AppState>,
    Query(query): Query<NftsQuery>,
) -> ApiResult<Json<NftsResponse>> {
    let mut nfts = state
        .store
        .nfts(NftFilter {
            category: query.category.clone(),
            ..NftFilter::default()
        })
        .await;

    match query.sort_by.as_deref() {
        Some("name") => nfts.sort_by(|a, b| a.name.cmp(&b.name)),
        // Newest first by default.
        _ => nfts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (nfts, pagination) = paginate(nfts, &page_query);

    Ok(Json(NftsResponse {
        success: true,
        nfts,
        pagination,
    }))
}

pub(crate) async fn get_nft(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<NftResponse>> {
    let nft = state
        .store
        .nft(id)
        .await
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NFT_NOT_FOUND", "NFT not found"))?;
    Ok(Json(NftResponse { success: true, nft }))
}

pub(crate) async fn nft_history(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<HistoryResponse>> {
    let nft = state
        .store
        .nft(id)
        .await
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NFT_NOT_FOUND", "NFT not found"))?;

    let mut history = vec![HistoryEvent {
        event_type: "created",
        from: nft.creator.clone(),
        to: nft.creator.clone(),
        timestamp: nft.created_at,
        tx_hash: None,
        price: None,
        quantity: None,
    }];

    let mut sales = state.store.sales_by_nft(id).await;
    sales.sort_by_key(|sale| sale.timestamp);
    history.extend(sales.into_iter().map(|sale| HistoryEvent {
        event_type: "sale",
        from: sale.seller,
        to: sale.buyer,
        timestamp: sale.timestamp,
        tx_hash: Some(sale.id),
        price: Some(sale.total_price),
        quantity: Some(sale.quantity),
    }));

    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

pub(crate) async fn categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        success: true,
        categories: CATEGORIES.to_vec(),
    })
}
