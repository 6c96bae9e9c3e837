use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A minted (or mint-ready) NFT record. The owner field only changes through
/// a purchase; there is no standalone transfer operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Gateway URL of the pinned image.
    pub image: String,
    /// SHA-256 of the uploaded image bytes, for duplicate detection.
    pub image_hash: String,
    pub category: Option<String>,
    pub royalty_percentage: f64,
    pub creator: String,
    pub owner: String,
    pub metadata_hash: String,
    pub metadata_uri: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNft {
    pub name: String,
    pub description: String,
    pub image: String,
    pub image_hash: String,
    pub category: Option<String>,
    pub royalty_percentage: f64,
    pub creator: String,
    pub metadata_hash: String,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: u64,
    pub nft_id: u64,
    pub seller: String,
    pub price: f64,
    pub quantity: u32,
    pub listed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub status: ListingStatus,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub nft_id: u64,
    pub seller: String,
    pub price: f64,
    pub quantity: u32,
    pub duration_seconds: u64,
}

/// Receipt of a completed purchase. Status stays `pending` until chain
/// confirmation, which happens outside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub listing_id: u64,
    pub nft_id: u64,
    pub buyer: String,
    pub seller: String,
    pub quantity: u32,
    pub price_per_unit: f64,
    pub total_price: f64,
    pub platform_fee: f64,
    pub seller_amount: f64,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub nfts_created: u64,
    pub nfts_owned: u64,
    pub total_sales: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub address: String,
    pub bio: String,
    pub avatar: String,
    pub banner: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub stats: UserStats,
    pub social: SocialLinks,
    pub verified: bool,
}

impl UserProfile {
    pub fn with_defaults(address: &str) -> Self {
        Self {
            address: address.to_string(),
            bio: String::new(),
            avatar: String::new(),
            banner: String::new(),
            created_at: Utc::now(),
            updated_at: None,
            stats: UserStats::default(),
            social: SocialLinks::default(),
            verified: false,
        }
    }
}
