use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::fees;
use crate::store::{ListingFilter, MarketStore, NftFilter, ProfileUpdate};
use crate::types::{
    Listing, ListingStatus, NewListing, NewNft, Nft, SaleRecord, UserProfile,
};

/// In-memory market store. A single `RwLock` over the whole state keeps the
/// purchase path atomic: the quantity check, decrement, status flip, and
/// sale record append happen under one write guard.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    nfts: HashMap<u64, Nft>,
    listings: HashMap<u64, Listing>,
    profiles: HashMap<String, UserProfile>,
    sales: Vec<SaleRecord>,
    next_nft_id: u64,
    next_listing_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_nft(&self, new: NewNft) -> Nft {
        let mut inner = self.inner.write().await;
        inner.next_nft_id += 1;
        let id = inner.next_nft_id;
        let nft = Nft {
            id,
            name: new.name,
            description: new.description,
            image: new.image,
            image_hash: new.image_hash,
            category: new.category,
            royalty_percentage: new.royalty_percentage,
            owner: new.creator.clone(),
            creator: new.creator,
            metadata_hash: new.metadata_hash,
            metadata_uri: new.metadata_uri,
            created_at: Utc::now(),
        };
        inner.nfts.insert(id, nft.clone());
        nft
    }

    async fn nft(&self, id: u64) -> Option<Nft> {
        self.inner.read().await.nfts.get(&id).cloned()
    }

    async fn nfts(&self, filter: NftFilter) -> Vec<Nft> {
        let inner = self.inner.read().await;
        inner
            .nfts
            .values()
            .filter(|nft| {
                filter
                    .category
                    .as_ref()
                    .map(|category| nft.category.as_deref() == Some(category.as_str()))
                    .unwrap_or(true)
                    && filter
                        .owner
                        .as_ref()
                        .map(|owner| &nft.owner == owner)
                        .unwrap_or(true)
                    && filter
                        .creator
                        .as_ref()
                        .map(|creator| &nft.creator == creator)
                        .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    async fn insert_listing(&self, new: NewListing) -> Result<Listing, StoreError> {
        if !(new.price > 0.0) {
            return Err(StoreError::InvalidPrice);
        }
        if new.quantity == 0 {
            return Err(StoreError::InvalidQuantity);
        }

        let mut inner = self.inner.write().await;
        if !inner.nfts.contains_key(&new.nft_id) {
            return Err(StoreError::NftNotFound);
        }

        inner.next_listing_id += 1;
        let id = inner.next_listing_id;
        let listed_at = Utc::now();
        let listing = Listing {
            id,
            nft_id: new.nft_id,
            seller: new.seller,
            price: new.price,
            quantity: new.quantity,
            listed_at,
            // Clamped to ten years so absurd durations cannot overflow.
            expires_at: listed_at
                + ChronoDuration::seconds(new.duration_seconds.clamp(1, 315_360_000) as i64),
            updated_at: None,
            cancelled_at: None,
            status: ListingStatus::Active,
        };
        inner.listings.insert(id, listing.clone());
        Ok(listing)
    }

    async fn listing(&self, id: u64) -> Option<Listing> {
        self.inner.read().await.listings.get(&id).cloned()
    }

    async fn listings(&self, filter: ListingFilter) -> Vec<Listing> {
        let inner = self.inner.read().await;
        inner
            .listings
            .values()
            .filter(|listing| {
                (!filter.active_only || listing.status == ListingStatus::Active)
                    && filter.min_price.map(|min| listing.price >= min).unwrap_or(true)
                    && filter.max_price.map(|max| listing.price <= max).unwrap_or(true)
                    && filter
                        .seller
                        .as_ref()
                        .map(|seller| &listing.seller == seller)
                        .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    async fn update_listing_price(
        &self,
        id: u64,
        seller: &str,
        price: f64,
    ) -> Result<Listing, StoreError> {
        if !(price > 0.0) {
            return Err(StoreError::InvalidPrice);
        }

        let mut inner = self.inner.write().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(StoreError::ListingNotFound)?;
        if listing.seller != seller {
            return Err(StoreError::NotSeller);
        }
        if listing.status != ListingStatus::Active {
            return Err(StoreError::ListingInactive);
        }

        listing.price = price;
        listing.updated_at = Some(Utc::now());
        Ok(listing.clone())
    }

    async fn cancel_listing(&self, id: u64, seller: &str) -> Result<Listing, StoreError> {
        let mut inner = self.inner.write().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(StoreError::ListingNotFound)?;
        if listing.seller != seller {
            return Err(StoreError::NotSeller);
        }
        if listing.status != ListingStatus::Active {
            return Err(StoreError::ListingInactive);
        }

        listing.status = ListingStatus::Cancelled;
        listing.cancelled_at = Some(Utc::now());
        Ok(listing.clone())
    }

    async fn purchase(
        &self,
        listing_id: u64,
        buyer: &str,
        quantity: u32,
    ) -> Result<SaleRecord, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity);
        }

        let mut inner = self.inner.write().await;
        let listing = inner
            .listings
            .get_mut(&listing_id)
            .ok_or(StoreError::ListingNotFound)?;
        if listing.status != ListingStatus::Active {
            return Err(StoreError::ListingInactive);
        }
        if quantity > listing.quantity {
            return Err(StoreError::InsufficientQuantity {
                requested: quantity,
                available: listing.quantity,
            });
        }

        listing.quantity -= quantity;
        if listing.quantity == 0 {
            listing.status = ListingStatus::Sold;
        }

        let split = fees::fee_split(listing.price, quantity);
        let sale = SaleRecord {
            id: format!("tx-{}", Uuid::new_v4()),
            listing_id,
            nft_id: listing.nft_id,
            buyer: buyer.to_string(),
            seller: listing.seller.clone(),
            quantity,
            price_per_unit: listing.price,
            total_price: split.total_price,
            platform_fee: split.platform_fee,
            seller_amount: split.seller_amount,
            timestamp: Utc::now(),
            status: "pending".to_string(),
        };
        inner.sales.push(sale.clone());
        Ok(sale)
    }

    async fn profile(&self, address: &str) -> UserProfile {
        {
            let inner = self.inner.read().await;
            if let Some(profile) = inner.profiles.get(address) {
                return profile.clone();
            }
        }

        let mut inner = self.inner.write().await;
        inner
            .profiles
            .entry(address.to_string())
            .or_insert_with(|| UserProfile::with_defaults(address))
            .clone()
    }

    async fn update_profile(&self, address: &str, update: ProfileUpdate) -> UserProfile {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .entry(address.to_string())
            .or_insert_with(|| UserProfile::with_defaults(address));

        if let Some(bio) = update.bio {
            profile.bio = bio;
        }
        if let Some(avatar) = update.avatar {
            profile.avatar = avatar;
        }
        if let Some(banner) = update.banner {
            profile.banner = banner;
        }
        if let Some(twitter) = update.twitter {
            profile.social.twitter = twitter;
        }
        if let Some(instagram) = update.instagram {
            profile.social.instagram = instagram;
        }
        if let Some(website) = update.website {
            profile.social.website = website;
        }
        profile.updated_at = Some(Utc::now());
        profile.clone()
    }

    async fn sales(&self) -> Vec<SaleRecord> {
        self.inner.read().await.sales.clone()
    }

    async fn sales_by_seller(&self, seller: &str) -> Vec<SaleRecord> {
        let inner = self.inner.read().await;
        inner
            .sales
            .iter()
            .filter(|sale| sale.seller == seller)
            .cloned()
            .collect()
    }

    async fn sales_by_nft(&self, nft_id: u64) -> Vec<SaleRecord> {
        let inner = self.inner.read().await;
        inner
            .sales
            .iter()
            .filter(|sale| sale.nft_id == nft_id)
            .cloned()
            .collect()
    }
}
