use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("nft not found")]
    NftNotFound,
    #[error("listing not found")]
    ListingNotFound,
    #[error("listing is not active")]
    ListingInactive,
    #[error("insufficient quantity available: requested {requested}, available {available}")]
    InsufficientQuantity { requested: u32, available: u32 },
    #[error("caller is not the seller of this listing")]
    NotSeller,
    #[error("price must be greater than 0")]
    InvalidPrice,
    #[error("quantity must be greater than 0")]
    InvalidQuantity,
}
