//! Fixed-point scales shared across the model.
//!
//! All quantities are integers carrying an implicit scale. Mixing scales
//! without going through the ratio constants below is a bug.

/// Mark and oracle prices. 1.0 == 10^10.
pub const PRICE_SCALE: u128 = 10_000_000_000;

/// Virtual base/quote reserves and sqrt_k. 1.0 == 10^10.
pub const RESERVE_SCALE: u128 = 10_000_000_000;

/// Quote-asset (collateral) amounts. 1.0 == 10^6.
pub const QUOTE_SCALE: u128 = 1_000_000;

/// Peg multiplier. 1.0 == 10^6.
pub const PEG_SCALE: u128 = 1_000_000;

/// Percentages. 100% == 10^6.
pub const PERCENTAGE_SCALE: u128 = 1_000_000;

/// Bid/ask spread fractions. 100% == 10^6.
pub const SPREAD_SCALE: u128 = 1_000_000;

/// Funding rates. 1.0 == 10^9.
pub const FUNDING_RATE_SCALE: u128 = 1_000_000_000;

/// Margin ratios. 1.0 == 10^4.
pub const MARGIN_SCALE: u128 = 10_000;

/// PRICE_SCALE / PEG_SCALE.
pub const PRICE_TO_PEG_RATIO: u128 = PRICE_SCALE / PEG_SCALE;

/// RESERVE_SCALE / QUOTE_SCALE.
pub const RESERVE_TO_QUOTE_RATIO: u128 = RESERVE_SCALE / QUOTE_SCALE;

/// RESERVE_SCALE * PEG_SCALE / QUOTE_SCALE.
pub const RESERVE_TIMES_PEG_TO_QUOTE_RATIO: u128 =
    RESERVE_SCALE / QUOTE_SCALE * PEG_SCALE;

pub const FIVE_MINUTE: i64 = 300;
pub const ONE_HOUR: i64 = 3600;

pub const MAX_PCT: u128 = 100;

/// Allowed overshoot, in price units, when solving a trade to a target price.
pub const TARGET_PRICE_TOLERANCE: u64 = 100_000;

/// Ratio returned by the budgeted-K controller when the budget cannot be
/// honored: shrink K by 1/10000.
pub const BUDGETED_K_FALLBACK: (u128, u128) = (10_000, 1);
