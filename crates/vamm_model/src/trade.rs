//! Target-price trade solver and curve liquidity bounds.
//!
//! The solver inverts `price = y Q / x` under `k = x y`: the post-trade
//! base reserve is `sqrt(k Q / target)` with a one-unit bias applied
//! against the trade direction so integer truncation can never push the
//! post-trade price past the target.

use ethnum::U256;

use crate::constants::{
    MAX_PCT, PEG_SCALE, PRICE_SCALE, RESERVE_TO_QUOTE_RATIO, TARGET_PRICE_TOLERANCE,
};
use crate::math::{cast, sqrt_u256, u256_to_u128};
use crate::state::{Amm, AssetType, PositionDirection};
use crate::swap::{calculate_price, reserve_to_asset_amount};
use crate::{CurveError, CurveResult};

/// Base reserve that puts the curve at `target_price`, before bias.
fn base_reserve_at_price(invariant: U256, peg_multiplier: u128, target_price: u64) -> U256 {
    let squared = invariant * U256::from(PRICE_SCALE) / U256::from(target_price)
        * U256::from(peg_multiplier)
        / U256::from(PEG_SCALE);
    sqrt_u256(squared)
}

/// Trade that moves the mark price to `target_price`, covering `pct`
/// percent of the gap. Returns `(direction, trade_size, entry_price,
/// new_price)`; the size is in quote or base units per
/// `output_asset_type`. A target equal to the mark is a zero trade.
pub fn calculate_target_price_trade(
    amm: &Amm,
    target_price: u64,
    pct: u128,
    output_asset_type: AssetType,
) -> CurveResult<(PositionDirection, u128, u64, u64)> {
    if target_price == 0 {
        return Err(CurveError::InvalidTargetPrice);
    }
    if pct == 0 || pct > MAX_PCT {
        return Err(CurveError::InvalidPercentage);
    }

    let mark_price = amm.reserve_price()?;
    let target_price = if pct < MAX_PCT {
        let gap = i128::from(target_price) - i128::from(mark_price);
        let scaled = i128::from(mark_price) + gap * cast::<u128, i128>(pct)? / MAX_PCT as i128;
        cast::<i128, u64>(scaled)?
    } else {
        target_price
    };

    if target_price == mark_price {
        return Ok((PositionDirection::Long, 0, 0, mark_price));
    }

    // solve off the actual reserve product, not the stored sqrt_k, so the
    // result lands relative to the reserves the caller sees
    let invariant = U256::from(amm.base_asset_reserve) * U256::from(amm.quote_asset_reserve);
    let unbiased = base_reserve_at_price(invariant, amm.peg_multiplier, target_price);

    // truncation can drive the solve to zero on degenerate snapshots
    // (unit reserves with an extreme peg); the bias would underflow there
    if unbiased <= U256::ONE {
        return Err(CurveError::InvalidReserves);
    }

    let (direction, new_base_reserve) = if target_price > mark_price {
        // price rises, base drains; one unit of slack keeps price <= target
        (PositionDirection::Long, unbiased + U256::ONE)
    } else {
        (PositionDirection::Short, unbiased - U256::ONE)
    };

    let new_base_reserve = u256_to_u128(new_base_reserve)?;
    let new_quote_reserve = u256_to_u128(invariant / U256::from(new_base_reserve))?;

    let base_delta = amm.base_asset_reserve.abs_diff(new_base_reserve);
    if base_delta == 0 {
        return Ok((direction, 0, 0, mark_price));
    }
    let quote_delta = amm.quote_asset_reserve.abs_diff(new_quote_reserve);
    let quote_size = reserve_to_asset_amount(quote_delta, amm.peg_multiplier)?;

    let entry_price = cast::<u128, u64>(u256_to_u128(
        U256::from(quote_size) * U256::from(PRICE_SCALE) * U256::from(RESERVE_TO_QUOTE_RATIO)
            / U256::from(base_delta),
    )?)?;

    let new_price = calculate_price(new_quote_reserve, new_base_reserve, amm.peg_multiplier)?;

    debug_assert!(
        mark_price.abs_diff(new_price) <= mark_price.abs_diff(target_price),
        "price moved {mark_price} -> {new_price} past target {target_price}"
    );
    debug_assert!(
        match direction {
            PositionDirection::Long => new_price <= target_price.saturating_add(TARGET_PRICE_TOLERANCE),
            PositionDirection::Short => new_price >= target_price.saturating_sub(TARGET_PRICE_TOLERANCE),
        },
        "solver overshot target {target_price}: new price {new_price}"
    );

    let trade_size = match output_asset_type {
        AssetType::Quote => quote_size,
        AssetType::Base => base_delta,
    };

    Ok((direction, trade_size, entry_price, new_price))
}

/// Base amount available between the current curve point and a limit
/// price, with the direction that walks toward it.
pub fn calculate_max_base_asset_amount_to_trade(
    amm: &Amm,
    limit_price: u64,
) -> CurveResult<(u128, PositionDirection)> {
    if limit_price == 0 {
        return Err(CurveError::InvalidTargetPrice);
    }
    let new_base_reserve = u256_to_u128(base_reserve_at_price(
        amm.invariant()?,
        amm.peg_multiplier,
        limit_price,
    ))?;

    if new_base_reserve > amm.base_asset_reserve {
        Ok((
            new_base_reserve - amm.base_asset_reserve,
            PositionDirection::Short,
        ))
    } else if new_base_reserve < amm.base_asset_reserve {
        Ok((
            amm.base_asset_reserve - new_base_reserve,
            PositionDirection::Long,
        ))
    } else {
        Ok((0, PositionDirection::Long))
    }
}

/// Curve liquidity open on each side, bounded by the configured reserve
/// limits. Bids are taker buy capacity (positive), asks taker sell
/// capacity (negative). A side whose half-capacity is below one order
/// step is zeroed as dust.
pub fn calculate_market_open_bid_ask(
    base_asset_reserve: u128,
    min_base_asset_reserve: u128,
    max_base_asset_reserve: u128,
    step_size: Option<u128>,
) -> CurveResult<(i128, i128)> {
    let mut open_bids = if base_asset_reserve > min_base_asset_reserve {
        cast::<u128, i128>(base_asset_reserve - min_base_asset_reserve)?
    } else {
        0
    };
    let mut open_asks = if max_base_asset_reserve > base_asset_reserve {
        -cast::<u128, i128>(max_base_asset_reserve - base_asset_reserve)?
    } else {
        0
    };

    if let Some(step_size) = step_size {
        let step_size = cast::<u128, i128>(step_size)?;
        if open_bids / 2 < step_size {
            open_bids = 0;
        }
        if open_asks.abs() / 2 < step_size {
            open_asks = 0;
        }
    }

    Ok((open_bids, open_asks))
}
