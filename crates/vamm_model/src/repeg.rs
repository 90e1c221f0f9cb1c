//! Cost model for administrative curve adjustments.
//!
//! Repegging moves the peg multiplier at fixed reserves; a K adjustment
//! rescales both reserves at a fixed net position. Both have closed-form
//! quote-asset costs, and both come with "budgeted" inverses that solve
//! for the adjustment a given cost budget can buy.

use ethnum::{I256, U256};
use log::warn;

use crate::constants::{
    BUDGETED_K_FALLBACK, PEG_SCALE, PERCENTAGE_SCALE, PRICE_SCALE, PRICE_TO_PEG_RATIO,
    RESERVE_TIMES_PEG_TO_QUOTE_RATIO, RESERVE_TO_QUOTE_RATIO,
};
use crate::math::{cast, i256_to_i128, reduce_ratio};
use crate::state::Amm;
use crate::{CurveError, CurveResult};

/// Quote cost of moving the peg to `new_peg` at fixed reserves.
/// Positive is paid by the curve, negative is collected by it.
///
/// Linear in the peg delta: peg changes leave the invariant untouched.
pub fn calculate_repeg_cost(amm: &Amm, new_peg: u128) -> CurveResult<i128> {
    let dqar = I256::from(amm.quote_asset_reserve) - I256::from(amm.terminal_quote_asset_reserve);
    let peg_delta = I256::from(new_peg) - I256::from(amm.peg_multiplier);
    let cost = dqar * peg_delta
        / I256::from(RESERVE_TO_QUOTE_RATIO)
        / I256::from(PEG_SCALE);
    i256_to_i128(cost)
}

/// Peg that would put the mark price at `target_price` at current
/// reserves, rounded half-up, floored at 1.
pub fn calculate_peg_from_target_price(
    target_price: u64,
    base_asset_reserve: u128,
    quote_asset_reserve: u128,
) -> CurveResult<u128> {
    if quote_asset_reserve == 0 {
        return Err(CurveError::InvalidReserves);
    }
    let peg = (U256::from(target_price) * U256::from(base_asset_reserve)
        / U256::from(quote_asset_reserve)
        + U256::from(PRICE_TO_PEG_RATIO / 2))
        / U256::from(PRICE_TO_PEG_RATIO);
    Ok(crate::math::u256_to_u128(peg)?.max(1))
}

/// New peg reachable within `budget`, biased toward `target_price`.
///
/// When the budget-implied peg delta already points toward the target (or
/// the reserve offset is zero, making repegs free), the target peg itself
/// is returned. Otherwise the linear cost identity is solved for the peg
/// the budget affords. The per-peg cost is nudged one unit away from zero
/// so the result never overspends the budget on truncation.
pub fn calculate_budgeted_peg(amm: &Amm, budget: i128, target_price: u64) -> CurveResult<u128> {
    let dqar = cast::<u128, i128>(amm.quote_asset_reserve)?
        .checked_sub(cast(amm.terminal_quote_asset_reserve)?)
        .ok_or(CurveError::Overflow)?;
    let mut per_peg_cost = dqar / RESERVE_TO_QUOTE_RATIO as i128;
    if per_peg_cost > 0 {
        per_peg_cost += 1;
    } else if per_peg_cost < 0 {
        per_peg_cost -= 1;
    }

    let target_peg = calculate_peg_from_target_price(
        target_price,
        amm.base_asset_reserve,
        amm.quote_asset_reserve,
    )?;

    let peg_change_dir = cast::<u128, i128>(target_peg)? - cast::<u128, i128>(amm.peg_multiplier)?;
    let use_target_peg =
        (per_peg_cost < 0 && peg_change_dir > 0) || (per_peg_cost > 0 && peg_change_dir < 0);
    if per_peg_cost == 0 || use_target_peg {
        return Ok(target_peg);
    }

    let budget_delta_peg = budget
        .checked_mul(PEG_SCALE as i128)
        .ok_or(CurveError::Overflow)?
        / per_peg_cost;
    let new_peg = cast::<u128, i128>(amm.peg_multiplier)?
        .checked_add(budget_delta_peg)
        .ok_or(CurveError::Overflow)?
        .max(1);
    cast(new_peg)
}

/// Quote cost of scaling K by `numerator / denominator` while holding the
/// net position constant. Increasing depth at a nonzero position is paid
/// for by the curve, so the raw identity is negated on the way out.
pub fn calculate_adjust_k_cost(amm: &Amm, numerator: u128, denominator: u128) -> CurveResult<i128> {
    if numerator == 0 || denominator == 0 {
        return Err(CurveError::DivisionByZero);
    }
    let x = I256::from(amm.base_asset_reserve);
    let y = I256::from(amm.quote_asset_reserve);
    let d = I256::from(amm.net_base_asset_amount);
    let q = I256::from(amm.peg_multiplier);

    let x_d = x + d;
    if x_d <= I256::ZERO {
        return Err(CurveError::InvalidReserves);
    }

    let quote_scale = y * d * q;
    let p = I256::from(numerator) * I256::from(PRICE_SCALE) / I256::from(denominator);

    let price = I256::from(PRICE_SCALE);
    let scaled_x_d = x * p / price + d;
    if scaled_x_d <= I256::ZERO {
        return Err(CurveError::InvalidReserves);
    }

    // padded by PERCENTAGE_SCALE^2 so the two division chains keep their
    // precision before the subtraction
    let pct = I256::from(PERCENTAGE_SCALE);
    let cost = (quote_scale * pct * pct / x_d
        - quote_scale * p * pct * pct / price / scaled_x_d)
        / pct
        / pct
        / I256::from(RESERVE_TO_QUOTE_RATIO)
        / I256::from(PEG_SCALE)
        * I256::from(-1i8);
    i256_to_i128(cost)
}

/// Budgeted-K solver over an AMM snapshot. See
/// [`_calculate_budgeted_k_scale`] for the raw form.
pub fn calculate_budgeted_k_scale(amm: &Amm, budget: i128) -> CurveResult<(u128, u128)> {
    _calculate_budgeted_k_scale(
        amm.base_asset_reserve,
        amm.quote_asset_reserve,
        budget,
        amm.peg_multiplier,
        amm.net_base_asset_amount,
    )
}

/// Solve for the `(numerator, denominator)` K scale whose adjustment cost
/// equals `budget` (same sign convention as [`calculate_adjust_k_cost`]).
///
/// The cost identity is linear in the scale ratio `p`:
///
/// ```text
/// p = d (ydQ/R - c(x+d)) / (c x (x+d) + y d^2 Q / R),  c = -budget
/// ```
///
/// with `R = RESERVE_TIMES_PEG_TO_QUOTE_RATIO`. The degenerate region
/// where the budget overwhelms the position-dependent denominator term
/// has no stable solution; the solver then declines with the documented
/// `(10000, 1)` sentinel rather than returning an extreme ratio. Callers
/// must treat that exact pair as "solver declined".
pub fn _calculate_budgeted_k_scale(
    x: u128,
    y: u128,
    budget: i128,
    q: u128,
    d: i128,
) -> CurveResult<(u128, u128)> {
    if budget == 0 {
        return Ok((1, 1));
    }
    if d == 0 {
        warn!("k budget of {budget} with no net position, declining");
        return Ok(BUDGETED_K_FALLBACK);
    }

    let c = -I256::from(budget);
    let x = I256::from(x);
    let y = I256::from(y);
    let q = I256::from(q);
    let d = I256::from(d);
    let ratio = I256::from(RESERVE_TIMES_PEG_TO_QUOTE_RATIO);

    let x_d = x + d;
    if x_d <= I256::ZERO {
        return Err(CurveError::InvalidReserves);
    }

    let inner = y * d * q / ratio;
    let numerator = d * (inner - c * x_d);
    let denom1 = c * x * x_d;
    let denom2 = y * d * d * q / ratio;

    if c < I256::ZERO && denom1.abs() > denom2 {
        warn!("k budget of {budget} exceeds stable solve region, declining");
        return Ok(BUDGETED_K_FALLBACK);
    }

    let denominator = denom1 + denom2;
    if numerator <= I256::ZERO || denominator <= I256::ZERO {
        warn!("k budget of {budget} has no positive scale solution, declining");
        return Ok(BUDGETED_K_FALLBACK);
    }

    let (numerator, denominator) = reduce_ratio(numerator, denominator)?;
    Ok((cast(numerator)?, cast(denominator)?))
}
