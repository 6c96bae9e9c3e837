use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Listing, NewListing, NewNft, Nft, SaleRecord, UserProfile};

#[derive(Debug, Clone, Default)]
pub struct NftFilter {
    pub category: Option<String>,
    pub owner: Option<String>,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// When true, only active listings are returned.
    pub active_only: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub seller: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

/// Storage capability for the marketplace. Every conditional mutation
/// (purchase, seller-gated updates) is a single call so implementations can
/// make it atomic.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn insert_nft(&self, new: NewNft) -> Nft;
    async fn nft(&self, id: u64) -> Option<Nft>;
    async fn nfts(&self, filter: NftFilter) -> Vec<Nft>;

    /// Validates price and the referenced NFT before inserting.
    async fn insert_listing(&self, new: NewListing) -> Result<Listing, StoreError>;
    async fn listing(&self, id: u64) -> Option<Listing>;
    async fn listings(&self, filter: ListingFilter) -> Vec<Listing>;
    async fn update_listing_price(
        &self,
        id: u64,
        seller: &str,
        price: f64,
    ) -> Result<Listing, StoreError>;
    async fn cancel_listing(&self, id: u64, seller: &str) -> Result<Listing, StoreError>;

    /// Atomic decrement-if-sufficient. On success the listing quantity has
    /// been reduced by `quantity` (status flipped to sold at zero) and a
    /// sale record has been persisted, all under one critical section.
    async fn purchase(
        &self,
        listing_id: u64,
        buyer: &str,
        quantity: u32,
    ) -> Result<SaleRecord, StoreError>;

    /// Lazily creates a zero-valued profile on first read.
    async fn profile(&self, address: &str) -> UserProfile;
    async fn update_profile(&self, address: &str, update: ProfileUpdate) -> UserProfile;

    async fn sales(&self) -> Vec<SaleRecord>;
    async fn sales_by_seller(&self, seller: &str) -> Vec<SaleRecord>;
    async fn sales_by_nft(&self, nft_id: u64) -> Vec<SaleRecord>;
}
