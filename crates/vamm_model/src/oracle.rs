//! Oracle trust gates and live estimators.
//!
//! Validity and divergence are boolean decisions for the caller, never
//! errors: a bad feed is an expected operating condition. The estimators
//! blend a live sample into the stored TWAP/deviation series without
//! mutating the snapshot.

use crate::constants::{FIVE_MINUTE, PERCENTAGE_SCALE, SPREAD_SCALE};
use crate::math::{cast, clamp};
use crate::state::{Amm, Market, OracleGuardRails, OraclePriceData};
use crate::{CurveError, CurveResult};

/// Which stored TWAP a live estimate blends against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwapPeriod {
    FiveMin,
    Funding,
}

/// Whether a feed sample may be traded against at all.
///
/// Pure AND of the five disqualifiers: insufficient data, staleness,
/// non-positive price, volatility against the stored TWAP (either
/// direction), and confidence width over the tier-adjusted cap. Total;
/// never errors.
pub fn is_oracle_valid(
    market: &Market,
    oracle: &OraclePriceData,
    guard_rails: &OracleGuardRails,
    slot: u64,
) -> bool {
    if !oracle.has_sufficient_number_of_data_points {
        return false;
    }
    if slot.saturating_sub(oracle.slot) > guard_rails.validity.slots_before_stale_for_amm {
        return false;
    }
    if oracle.price <= 0 {
        return false;
    }

    let twap = market.amm.historical_oracle_data.last_oracle_price_twap;
    let too_volatile = guard_rails.validity.too_volatile_ratio;
    if oracle.price / twap.max(1) > too_volatile || twap / oracle.price.max(1) > too_volatile {
        return false;
    }

    let conf_pct = u128::from(oracle.confidence.max(1)) * SPREAD_SCALE
        / oracle.price.unsigned_abs() as u128;
    let max_conf = u128::from(guard_rails.validity.confidence_interval_max_size)
        * u128::from(market.contract_tier.max_confidence_interval_multiplier());
    conf_pct <= max_conf
}

/// Whether the live price has pulled too far from the blended 5-minute
/// oracle TWAP. The threshold is the configured divergence cap floored
/// at 10%. Total; a degenerate blended TWAP counts as divergent.
pub fn is_oracle_too_divergent(
    amm: &Amm,
    oracle: &OraclePriceData,
    guard_rails: &OracleGuardRails,
    now: i64,
) -> bool {
    let hist = &amm.historical_oracle_data;
    let since_last = now.saturating_sub(hist.last_oracle_price_twap_ts).max(0) as i128;
    let since_start = (FIVE_MINUTE as i128 - since_last).max(0);
    let price = i128::from(oracle.price);

    let twap_5min = (i128::from(hist.last_oracle_price_twap_5min) * since_start
        + price * since_last)
        / (since_start + since_last).max(1);
    if twap_5min <= 0 {
        return true;
    }

    let spread_pct = (twap_5min - price).abs() * PERCENTAGE_SCALE as i128 / twap_5min;
    let max_divergence = i128::from(guard_rails.price_divergence.mark_oracle_percent_divergence)
        .max(PERCENTAGE_SCALE as i128 / 10);
    spread_pct >= max_divergence
}

/// Time-weighted blend of the stored TWAP and a clamped live sample.
///
/// The live price is clamped to within a third of the stored TWAP first,
/// bounding how far a single bad print can drag one update.
pub fn calculate_live_oracle_twap(
    amm: &Amm,
    oracle: &OraclePriceData,
    now: i64,
    period: TwapPeriod,
) -> CurveResult<i64> {
    let hist = &amm.historical_oracle_data;
    let (window, stored_twap) = match period {
        TwapPeriod::FiveMin => (FIVE_MINUTE, hist.last_oracle_price_twap_5min),
        TwapPeriod::Funding => (amm.funding_period, hist.last_oracle_price_twap),
    };

    let since_last = now
        .checked_sub(hist.last_oracle_price_twap_ts)
        .ok_or(CurveError::Overflow)?
        .max(1);
    let since_start = window.saturating_sub(since_last).max(0);

    let clamp_range = stored_twap / 3;
    let clamped_price = clamp(
        oracle.price,
        stored_twap - clamp_range,
        stored_twap + clamp_range,
    );

    let new_twap = (i128::from(stored_twap) * i128::from(since_start)
        + i128::from(clamped_price) * i128::from(since_last))
        / i128::from(since_start + since_last);
    cast(new_twap)
}

/// Running mean-absolute-deviation of the oracle against its live
/// funding-period TWAP, decayed by elapsed time.
pub fn calculate_live_oracle_std(
    amm: &Amm,
    oracle: &OraclePriceData,
    now: i64,
) -> CurveResult<u64> {
    let since_last = now
        .checked_sub(amm.historical_oracle_data.last_oracle_price_twap_ts)
        .ok_or(CurveError::Overflow)?
        .max(1);
    let since_start = amm.funding_period.saturating_sub(since_last).max(0);

    let live_twap = calculate_live_oracle_twap(amm, oracle, now, TwapPeriod::Funding)?;
    let price_delta_vs_twap = u128::from(oracle.price.abs_diff(live_twap));

    let decayed_std = u128::from(amm.oracle_std) * since_start as u128
        / (since_start + since_last) as u128;
    cast(price_delta_vs_twap + decayed_std)
}

/// New confidence-interval percentage: the fresh confidence-to-price
/// ratio, floored by a slow decay of the previous value so confidence
/// never snaps tighter in one step. The decay divisor shrinks from 21
/// toward 5 as the series goes unobserved.
pub fn get_new_oracle_conf_pct(
    amm: &Amm,
    oracle: &OraclePriceData,
    reserve_price: u64,
    now: i64,
) -> CurveResult<u64> {
    if reserve_price == 0 {
        return Err(CurveError::DivisionByZero);
    }

    let since_last = now
        .saturating_sub(amm.historical_oracle_data.last_oracle_price_twap_ts)
        .max(0);
    let mut lower_bound_conf_pct = amm.last_oracle_conf_pct;
    if since_last > 0 {
        let lower_bound_conf_divisor = (21i64 - since_last).max(5) as u64;
        lower_bound_conf_pct =
            amm.last_oracle_conf_pct - amm.last_oracle_conf_pct / lower_bound_conf_divisor;
    }

    let conf_interval_pct = u128::from(oracle.confidence) * SPREAD_SCALE / u128::from(reserve_price);
    Ok(cast::<u128, u64>(conf_interval_pct)?.max(lower_bound_conf_pct))
}
