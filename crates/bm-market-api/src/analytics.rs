use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::Json;
use bm_store::{ListingFilter, MarketStore, NftFilter};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{ApiResult, AppState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceStats {
    pub total_volume: f64,
    pub total_sales: u64,
    pub total_nfts: u64,
    pub total_users: u64,
    pub active_listings: u64,
    pub unique_buyers: u64,
    pub unique_sellers: u64,
    pub floor_price: f64,
    pub average_price: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRanking {
    pub address: String,
    pub nfts_created: u64,
    pub total_volume: f64,
    pub total_sales: u64,
    pub average_price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerRanking {
    pub address: String,
    pub nfts_purchased: u64,
    pub total_spent: f64,
    pub average_price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingNft {
    pub id: u64,
    pub name: String,
    pub image: String,
    pub creator: String,
    pub sales_24h: u64,
    pub volume_24h: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_price: Option<f64>,
}

/// Aggregation contract for marketplace analytics. Inputs are a ranking
/// limit (and, for trending, a 24h window anchored at call time); outputs are
/// typed aggregates. The shipped implementation reads the in-process store;
/// an external warehouse-backed provider can be swapped in behind this trait.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn marketplace_stats(&self) -> MarketplaceStats;
    async fn top_creators(&self, limit: usize) -> Vec<CreatorRanking>;
    async fn top_buyers(&self, limit: usize) -> Vec<BuyerRanking>;
    async fn trending(&self, limit: usize) -> Vec<TrendingNft>;
}

pub struct StoreStatsProvider {
    store: Arc<dyn MarketStore>,
}

impl StoreStatsProvider {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatsProvider for StoreStatsProvider {
    async fn marketplace_stats(&self) -> MarketplaceStats {
        let sales = self.store.sales().await;
        let nfts = self.store.nfts(NftFilter::default()).await;
        let active = self
            .store
            .listings(ListingFilter {
                active_only: true,
                ..ListingFilter::default()
            })
            .await;

        let total_volume: f64 = sales.iter().map(|sale| sale.total_price).sum();
        let units_sold: u64 = sales.iter().map(|sale| u64::from(sale.quantity)).sum();

        let mut users: HashSet<&str> = HashSet::new();
        let mut buyers: HashSet<&str> = HashSet::new();
        let mut sellers: HashSet<&str> = HashSet::new();
        for nft in &nfts {
            users.insert(nft.creator.as_str());
        }
        for sale in &sales {
            users.insert(sale.buyer.as_str());
            users.insert(sale.seller.as_str());
            buyers.insert(sale.buyer.as_str());
            sellers.insert(sale.seller.as_str());
        }

        let floor_price = active
            .iter()
            .map(|listing| listing.price)
            .fold(f64::INFINITY, f64::min);

        MarketplaceStats {
            total_volume,
            total_sales: sales.len() as u64,
            total_nfts: nfts.len() as u64,
            total_users: users.len() as u64,
            active_listings: active.len() as u64,
            unique_buyers: buyers.len() as u64,
            unique_sellers: sellers.len() as u64,
            floor_price: if floor_price.is_finite() {
                floor_price
            } else {
                0.0
            },
            average_price: if units_sold > 0 {
                total_volume / units_sold as f64
            } else {
                0.0
            },
            last_updated: Utc::now(),
        }
    }

    async fn top_creators(&self, limit: usize) -> Vec<CreatorRanking> {
        let nfts = self.store.nfts(NftFilter::default()).await;
        let sales = self.store.sales().await;

        let creator_by_nft: HashMap<u64, &str> = nfts
            .iter()
            .map(|nft| (nft.id, nft.creator.as_str()))
            .collect();

        let mut rankings: HashMap<&str, CreatorRanking> = HashMap::new();
        for nft in &nfts {
            rankings
                .entry(nft.creator.as_str())
                .or_insert_with(|| CreatorRanking {
                    address: nft.creator.clone(),
                    nfts_created: 0,
                    total_volume: 0.0,
                    total_sales: 0,
                    average_price: 0.0,
                })
                .nfts_created += 1;
        }
        for sale in &sales {
            let Some(creator) = creator_by_nft.get(&sale.nft_id) else {
                continue;
            };
            if let Some(entry) = rankings.get_mut(creator) {
                entry.total_volume += sale.total_price;
                entry.total_sales += 1;
            }
        }

        let mut rankings: Vec<CreatorRanking> = rankings
            .into_values()
            .map(|mut entry| {
                if entry.total_sales > 0 {
                    entry.average_price = entry.total_volume / entry.total_sales as f64;
                }
                entry
            })
            .collect();
        rankings.sort_by(|a, b| b.total_volume.total_cmp(&a.total_volume));
        rankings.truncate(limit);
        rankings
    }

    async fn top_buyers(&self, limit: usize) -> Vec<BuyerRanking> {
        let sales = self.store.sales().await;

        let mut rankings: HashMap<&str, BuyerRanking> = HashMap::new();
        for sale in &sales {
            let entry = rankings
                .entry(sale.buyer.as_str())
                .or_insert_with(|| BuyerRanking {
                    address: sale.buyer.clone(),
                    nfts_purchased: 0,
                    total_spent: 0.0,
                    average_price: 0.0,
                });
            entry.nfts_purchased += u64::from(sale.quantity);
            entry.total_spent += sale.total_price;
        }

        let mut rankings: Vec<BuyerRanking> = rankings
            .into_values()
            .map(|mut entry| {
                if entry.nfts_purchased > 0 {
                    entry.average_price = entry.total_spent / entry.nfts_purchased as f64;
                }
                entry
            })
            .collect();
        rankings.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
        rankings.truncate(limit);
        rankings
    }

    async fn trending(&self, limit: usize) -> Vec<TrendingNft> {
        let cutoff = Utc::now() - ChronoDuration::hours(24);
        let sales = self.store.sales().await;
        let nfts = self.store.nfts(NftFilter::default()).await;
        let active = self
            .store
            .listings(ListingFilter {
                active_only: true,
                ..ListingFilter::default()
            })
            .await;

        let mut floor_by_nft: HashMap<u64, f64> = HashMap::new();
        for listing in &active {
            floor_by_nft
                .entry(listing.nft_id)
                .and_modify(|floor| *floor = floor.min(listing.price))
                .or_insert(listing.price);
        }

        let mut activity: HashMap<u64, (u64, f64)> = HashMap::new();
        for sale in sales.iter().filter(|sale| sale.timestamp >= cutoff) {
            let entry = activity.entry(sale.nft_id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += sale.total_price;
        }

        let mut trending: Vec<TrendingNft> = nfts
            .iter()
            .filter_map(|nft| {
                let (sales_24h, volume_24h) = activity.get(&nft.id).copied()?;
                Some(TrendingNft {
                    id: nft.id,
                    name: nft.name.clone(),
                    image: nft.image.clone(),
                    creator: nft.creator.clone(),
                    sales_24h,
                    volume_24h,
                    floor_price: floor_by_nft.get(&nft.id).copied(),
                })
            })
            .collect();
        trending.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h));
        trending.truncate(limit);
        trending
    }
}

#[derive(Deserialize)]
pub(crate) struct RankingQuery {
    pub limit: Option<usize>,
}

impl RankingQuery {
    fn limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, 100)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    pub success: bool,
    pub stats: MarketplaceStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatorsResponse {
    pub success: bool,
    pub creators: Vec<CreatorRanking>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuyersResponse {
    pub success: bool,
    pub buyers: Vec<BuyerRanking>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrendingResponse {
    pub success: bool,
    pub nfts: Vec<TrendingNft>,
}

pub(crate) async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        success: true,
        stats: state.stats.marketplace_stats().await,
    }))
}

pub(crate) async fn top_creators(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<CreatorsResponse>> {
    Ok(Json(CreatorsResponse {
        success: true,
        creators: state.stats.top_creators(query.limit(10)).await,
    }))
}

pub(crate) async fn top_buyers(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<BuyersResponse>> {
    Ok(Json(BuyersResponse {
        success: true,
        buyers: state.stats.top_buyers(query.limit(10)).await,
    }))
}

pub(crate) async fn trending(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<TrendingResponse>> {
    Ok(Json(TrendingResponse {
        success: true,
        nfts: state.stats.trending(query.limit(20)).await,
    }))
}
