/// Marketplace cut, in basis points.
pub const PLATFORM_FEE_BPS: u32 = 250;

/// Royalty bounds accepted at NFT creation, in percent.
pub const MAX_ROYALTY_PERCENTAGE: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSplit {
    pub total_price: f64,
    pub platform_fee: f64,
    pub seller_amount: f64,
}

/// Split a sale total between platform and seller. The platform fee is
/// floored, so small sales round in the seller's favor.
pub fn fee_split(price_per_unit: f64, quantity: u32) -> FeeSplit {
    let total_price = price_per_unit * f64::from(quantity);
    let platform_fee = (total_price * f64::from(PLATFORM_FEE_BPS) / 10_000.0).floor();
    FeeSplit {
        total_price,
        platform_fee,
        seller_amount: total_price - platform_fee,
    }
}

pub fn royalty_in_range(percentage: f64) -> bool {
    percentage.is_finite() && (0.0..=MAX_ROYALTY_PERCENTAGE).contains(&percentage)
}
