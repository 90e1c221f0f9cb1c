//! Market and oracle state snapshots consumed by the engine.
//!
//! These are plain value types. The subscription layer that keeps them
//! fresh lives elsewhere; every function here takes them read-only and
//! returns new values instead of mutating in place.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::SPREAD_SCALE;
use crate::swap;
use crate::{CurveError, CurveResult};

/// Virtual-AMM state for one perp market.
///
/// Reserves and `sqrt_k` carry `RESERVE_SCALE`, the peg carries
/// `PEG_SCALE`. `net_base_asset_amount` is the curve's net taker
/// position; nonzero means current reserves sit off the terminal
/// (no-position) point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amm {
    pub base_asset_reserve: u128,
    pub quote_asset_reserve: u128,
    pub sqrt_k: u128,
    pub peg_multiplier: u128,
    pub net_base_asset_amount: i128,
    /// Quote reserve the curve would hold at zero net position.
    pub terminal_quote_asset_reserve: u128,
    pub min_base_asset_reserve: u128,
    pub max_base_asset_reserve: u128,
    pub order_step_size: u64,
    pub historical_oracle_data: HistoricalOracleData,
    /// Running mean-absolute-deviation of the oracle series.
    pub oracle_std: u64,
    pub last_oracle_conf_pct: u64,
    pub funding_period: i64,
}

impl Amm {
    /// K as a 256-bit product of the stored square root.
    pub(crate) fn invariant(&self) -> CurveResult<U256> {
        if self.sqrt_k == 0 {
            return Err(CurveError::InvalidSqrtK);
        }
        Ok(U256::from(self.sqrt_k) * U256::from(self.sqrt_k))
    }

    /// Current mark price off the snapshot, in `PRICE_SCALE`.
    pub fn reserve_price(&self) -> CurveResult<u64> {
        swap::calculate_price(
            self.quote_asset_reserve,
            self.base_asset_reserve,
            self.peg_multiplier,
        )
    }
}

/// One perp market: the curve plus its risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Market {
    pub amm: Amm,
    pub contract_tier: ContractTier,
}

/// Risk tier of a market, selecting how wide an oracle confidence
/// interval it will still trade against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ContractTier {
    A,
    B,
    #[default]
    C,
    Speculative,
    Isolated,
}

impl ContractTier {
    pub fn max_confidence_interval_multiplier(&self) -> u64 {
        match self {
            ContractTier::A => 1,
            ContractTier::B => 1,
            ContractTier::C => 2,
            ContractTier::Speculative => 10,
            ContractTier::Isolated => 50,
        }
    }
}

/// Trade direction from the taker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionDirection {
    Long,
    Short,
}

/// Whether a swap adds an asset to the pool or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    Add,
    Remove,
}

/// Which side of the pair a swap amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Base,
    Quote,
}

/// Last-known oracle series values carried on the AMM snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoricalOracleData {
    pub last_oracle_price: i64,
    pub last_oracle_conf: u64,
    pub last_oracle_price_twap: i64,
    pub last_oracle_price_twap_5min: i64,
    pub last_oracle_price_twap_ts: i64,
}

/// One sample from the price feed. Read-only input produced by an
/// external oracle reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePriceData {
    /// `PRICE_SCALE`, signed because feeds can misbehave.
    pub price: i64,
    pub confidence: u64,
    pub slot: u64,
    pub has_sufficient_number_of_data_points: bool,
}

impl OraclePriceData {
    /// Confidence width as a fraction of price, in `SPREAD_SCALE`.
    pub fn conf_pct(&self) -> CurveResult<u64> {
        if self.price <= 0 {
            return Err(CurveError::DivisionByZero);
        }
        let conf = u128::from(self.confidence.max(1));
        let pct = conf
            .checked_mul(SPREAD_SCALE)
            .ok_or(CurveError::Overflow)?
            / self.price.unsigned_abs() as u128;
        crate::math::cast(pct)
    }
}

/// Risk-parameter thresholds bounding oracle trust. Mirrors the
/// authoritative on-chain configuration; supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleGuardRails {
    pub validity: ValidityGuardRails,
    pub price_divergence: PriceDivergenceGuardRails,
}

impl Default for OracleGuardRails {
    fn default() -> Self {
        Self {
            validity: ValidityGuardRails {
                slots_before_stale_for_amm: 10,
                too_volatile_ratio: 5,
                confidence_interval_max_size: 20_000,
            },
            price_divergence: PriceDivergenceGuardRails {
                mark_oracle_percent_divergence: crate::constants::PERCENTAGE_SCALE as u64 / 10,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityGuardRails {
    pub slots_before_stale_for_amm: u64,
    /// Price/TWAP ratio (either direction) above this is too volatile.
    pub too_volatile_ratio: i64,
    /// Max confidence width in `SPREAD_SCALE`, before the tier multiplier.
    pub confidence_interval_max_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDivergenceGuardRails {
    /// `PERCENTAGE_SCALE`-scaled mark/oracle divergence cap.
    pub mark_oracle_percent_divergence: u64,
}
