//! Marketplace data model and storage.
//!
//! Handlers talk to the [`MarketStore`] trait so the in-memory backend can be
//! swapped for a real database without touching route logic. The in-memory
//! backend owns every cross-request invariant, most importantly the atomic
//! decrement-if-sufficient purchase path.

pub mod error;
pub mod fees;
pub mod memory;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{ListingFilter, MarketStore, NftFilter, ProfileUpdate};
pub use types::{
    Listing, ListingStatus, NewListing, NewNft, Nft, SaleRecord, SocialLinks, UserProfile,
    UserStats,
};
