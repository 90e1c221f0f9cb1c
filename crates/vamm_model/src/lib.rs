//! Off-chain pricing model for a virtual-AMM perpetual futures market.
//!
//! The curve is a constant-product invariant over virtual base and quote
//! reserves with a peg multiplier applied on the quote side. Everything is
//! scaled-integer arithmetic; floats appear only at the input conversion
//! boundary ([`math::f64_to_scaled`]).
//!
//! The crate is split by concern:
//! - [`swap`]: spot price, reserve conversions, curve traversal
//! - [`repeg`]: peg and K adjustment costs plus the budgeted controllers
//! - [`oracle`]: oracle validity gates, live TWAP/std, confidence tracking
//! - [`trade`]: target-price trade solver and liquidity bounds
//! - [`book`]: synthetic order-book levels walked off the curve

pub mod book;
pub mod constants;
pub mod math;
pub mod oracle;
pub mod repeg;
pub mod state;
pub mod swap;
pub mod trade;

use thiserror::Error;

/// Errors surfaced by curve and controller math.
///
/// Overflow on intermediate products is an error, never a wrap or a
/// saturation: callers are expected to treat any variant as "do not act
/// on this market".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("reserves must be nonzero")]
    InvalidReserves,
    #[error("sqrt_k must be nonzero")]
    InvalidSqrtK,
    #[error("trade size exceeds available reserves")]
    TradeSizeTooLarge,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("target price must be nonzero")]
    InvalidTargetPrice,
    #[error("percentage out of range")]
    InvalidPercentage,
    #[error("value does not fit the destination type")]
    InvalidConversion,
}

pub type CurveResult<T> = Result<T, CurveError>;

pub use book::{BookLevel, VammBook};
pub use state::{
    Amm, AssetType, ContractTier, HistoricalOracleData, Market, OracleGuardRails,
    OraclePriceData, PositionDirection, PriceDivergenceGuardRails, SwapDirection,
    ValidityGuardRails,
};
