//! Constant-product swap simulation over the virtual reserves.
//!
//! The invariant is `base * quote == sqrt_k^2` exactly in scaled-integer
//! arithmetic. Output-reserve division truncates toward zero, so the
//! post-swap product never exceeds K from the pool's side. That bias is
//! deliberate and covered by the property tests.

use ethnum::U256;

use crate::constants::{PRICE_TO_PEG_RATIO, RESERVE_TIMES_PEG_TO_QUOTE_RATIO};
use crate::math::{cast, u256_to_u128};
use crate::state::{Amm, AssetType, PositionDirection, SwapDirection};
use crate::{CurveError, CurveResult};

/// Which way the pool's reserve moves for a taker order on one side of
/// the pair. Buying base (or paying in quote on a short) drains the pool.
pub fn swap_direction(asset_type: AssetType, direction: PositionDirection) -> SwapDirection {
    match (asset_type, direction) {
        (AssetType::Base, PositionDirection::Long) => SwapDirection::Remove,
        (AssetType::Quote, PositionDirection::Short) => SwapDirection::Remove,
        _ => SwapDirection::Add,
    }
}

/// Mark price implied by a reserve pair and peg, in `PRICE_SCALE`.
///
/// A zero base reserve is an upstream snapshot bug, not a normal input.
pub fn calculate_price(
    quote_asset_reserve: u128,
    base_asset_reserve: u128,
    peg_multiplier: u128,
) -> CurveResult<u64> {
    if base_asset_reserve == 0 || quote_asset_reserve == 0 {
        return Err(CurveError::InvalidReserves);
    }
    let price = U256::from(quote_asset_reserve) * U256::from(peg_multiplier)
        * U256::from(PRICE_TO_PEG_RATIO)
        / U256::from(base_asset_reserve);
    cast(u256_to_u128(price)?)
}

/// Quote amount (`QUOTE_SCALE`) -> reserve units (`RESERVE_SCALE`).
pub fn asset_to_reserve_amount(quote_asset_amount: u128, peg_multiplier: u128) -> CurveResult<u128> {
    if peg_multiplier == 0 {
        return Err(CurveError::DivisionByZero);
    }
    let scaled = U256::from(quote_asset_amount) * U256::from(RESERVE_TIMES_PEG_TO_QUOTE_RATIO)
        / U256::from(peg_multiplier);
    u256_to_u128(scaled)
}

/// Reserve units (`RESERVE_SCALE`) -> quote amount (`QUOTE_SCALE`).
pub fn reserve_to_asset_amount(reserve_amount: u128, peg_multiplier: u128) -> CurveResult<u128> {
    let scaled = U256::from(reserve_amount) * U256::from(peg_multiplier)
        / U256::from(RESERVE_TIMES_PEG_TO_QUOTE_RATIO);
    u256_to_u128(scaled)
}

/// Low-level curve step: apply `swap_amount` to one reserve and rebalance
/// the other off the invariant. Returns `(new_input, new_output)`.
pub fn calculate_swap_output(
    swap_amount: u128,
    input_asset_reserve: u128,
    direction: SwapDirection,
    invariant_sqrt: u128,
) -> CurveResult<(u128, u128)> {
    if invariant_sqrt == 0 {
        return Err(CurveError::InvalidSqrtK);
    }
    let invariant = U256::from(invariant_sqrt) * U256::from(invariant_sqrt);

    if direction == SwapDirection::Remove && swap_amount >= input_asset_reserve {
        return Err(CurveError::TradeSizeTooLarge);
    }

    let new_input_amount = match direction {
        SwapDirection::Add => input_asset_reserve
            .checked_add(swap_amount)
            .ok_or(CurveError::Overflow)?,
        SwapDirection::Remove => input_asset_reserve - swap_amount,
    };
    let new_output_amount = u256_to_u128(invariant / U256::from(new_input_amount))?;

    Ok((new_input_amount, new_output_amount))
}

/// Post-swap reserves for a taker order on either side of the pair.
/// Returns `(new_quote_asset_reserve, new_base_asset_reserve)` and leaves
/// the snapshot untouched. Zero input is a no-op.
pub fn calculate_amm_reserves_after_swap(
    amm: &Amm,
    input_asset_type: AssetType,
    input_amount: u128,
    direction: SwapDirection,
) -> CurveResult<(u128, u128)> {
    if input_amount == 0 {
        return Ok((amm.quote_asset_reserve, amm.base_asset_reserve));
    }

    match input_asset_type {
        AssetType::Quote => {
            let amount = asset_to_reserve_amount(input_amount, amm.peg_multiplier)?;
            let (new_quote, new_base) =
                calculate_swap_output(amount, amm.quote_asset_reserve, direction, amm.sqrt_k)?;
            Ok((new_quote, new_base))
        }
        AssetType::Base => {
            let (new_base, new_quote) =
                calculate_swap_output(input_amount, amm.base_asset_reserve, direction, amm.sqrt_k)?;
            Ok((new_quote, new_base))
        }
    }
}

/// Quote amount a taker paid or received for a given quote-reserve move.
/// The extra unit on `Remove` rounds against the taker, matching the
/// authoritative program.
pub fn calculate_quote_asset_amount_swapped(
    quote_asset_reserve_before: u128,
    quote_asset_reserve_after: u128,
    direction: SwapDirection,
    peg_multiplier: u128,
) -> CurveResult<u128> {
    let reserve_change = match direction {
        SwapDirection::Add => quote_asset_reserve_before
            .checked_sub(quote_asset_reserve_after)
            .ok_or(CurveError::Overflow)?,
        SwapDirection::Remove => quote_asset_reserve_after
            .checked_sub(quote_asset_reserve_before)
            .ok_or(CurveError::Overflow)?
            .checked_add(1)
            .ok_or(CurveError::Overflow)?,
    };

    let mut amount = reserve_to_asset_amount(reserve_change, peg_multiplier)?;
    if direction == SwapDirection::Remove {
        amount = amount.checked_add(1).ok_or(CurveError::Overflow)?;
    }
    Ok(amount)
}

/// Reserves the curve would hold after unwinding the net position.
/// Returns `(terminal_quote_asset_reserve, terminal_base_asset_reserve)`.
pub fn calculate_terminal_reserves(amm: &Amm) -> CurveResult<(u128, u128)> {
    if amm.net_base_asset_amount == 0 {
        return Ok((amm.quote_asset_reserve, amm.base_asset_reserve));
    }
    let direction = if amm.net_base_asset_amount > 0 {
        SwapDirection::Add
    } else {
        SwapDirection::Remove
    };
    let (new_base, new_quote) = calculate_swap_output(
        amm.net_base_asset_amount.unsigned_abs(),
        amm.base_asset_reserve,
        direction,
        amm.sqrt_k,
    )?;
    Ok((new_quote, new_base))
}

/// Mark price at the terminal (zero net position) reserves.
pub fn calculate_terminal_price(amm: &Amm) -> CurveResult<u64> {
    let (terminal_quote, terminal_base) = calculate_terminal_reserves(amm)?;
    calculate_price(terminal_quote, terminal_base, amm.peg_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    fn fixture() -> Amm {
        Amm {
            base_asset_reserve: 500_000_000 * RESERVE_SCALE,
            quote_asset_reserve: 500_000_000 * RESERVE_SCALE,
            sqrt_k: 500_000_000 * RESERVE_SCALE,
            peg_multiplier: 150 * PEG_SCALE,
            ..Amm::default()
        }
    }

    #[test]
    fn price_of_balanced_reserves_is_the_peg() {
        let amm = fixture();
        let price = calculate_price(
            amm.quote_asset_reserve,
            amm.base_asset_reserve,
            amm.peg_multiplier,
        )
        .unwrap();
        assert_eq!(price, 150 * PRICE_SCALE as u64);
    }

    #[test]
    fn price_rejects_zero_reserves() {
        assert_eq!(
            calculate_price(0, 1, 1).unwrap_err(),
            CurveError::InvalidReserves
        );
        assert_eq!(
            calculate_price(1, 0, 1).unwrap_err(),
            CurveError::InvalidReserves
        );
    }

    #[test]
    fn quote_conversion_cancels_the_peg() {
        // 1.0 quote at peg 150 is 1/150 of a base unit in reserve space.
        let reserve = asset_to_reserve_amount(QUOTE_SCALE, 150 * PEG_SCALE).unwrap();
        assert_eq!(reserve, 66_666_666);
        let back = reserve_to_asset_amount(reserve, 150 * PEG_SCALE).unwrap();
        assert_eq!(back, QUOTE_SCALE - 1);
    }

    #[test]
    fn swap_output_preserves_invariant_and_direction() {
        let amm = fixture();
        let amount = 100_000_000 * RESERVE_SCALE;
        let (new_base, new_quote) = calculate_swap_output(
            amount,
            amm.base_asset_reserve,
            SwapDirection::Add,
            amm.sqrt_k,
        )
        .unwrap();
        assert_eq!(new_base, 600_000_000 * RESERVE_SCALE);
        assert_eq!(new_quote, 4_166_666_666_666_666_666);
        // product never exceeds k from the pool's side
        let k = ethnum::U256::from(amm.sqrt_k) * ethnum::U256::from(amm.sqrt_k);
        let product = ethnum::U256::from(new_base) * ethnum::U256::from(new_quote);
        assert!(product <= k);
        assert!(ethnum::U256::from(new_base) * ethnum::U256::from(new_quote + 1) > k);
    }

    #[test]
    fn removing_the_whole_reserve_is_rejected() {
        let amm = fixture();
        let err = calculate_swap_output(
            amm.base_asset_reserve,
            amm.base_asset_reserve,
            SwapDirection::Remove,
            amm.sqrt_k,
        )
        .unwrap_err();
        assert_eq!(err, CurveError::TradeSizeTooLarge);
    }

    #[test]
    fn reserves_after_swap_match_low_level_output() {
        let amm = fixture();
        let amount = 123_456_789 * RESERVE_SCALE;
        let (q1, b1) =
            calculate_amm_reserves_after_swap(&amm, AssetType::Base, amount, SwapDirection::Add)
                .unwrap();
        let (b2, q2) =
            calculate_swap_output(amount, amm.base_asset_reserve, SwapDirection::Add, amm.sqrt_k)
                .unwrap();
        assert_eq!((q1, b1), (q2, b2));
    }

    #[test]
    fn zero_input_leaves_reserves_unchanged() {
        let amm = fixture();
        let (q, b) =
            calculate_amm_reserves_after_swap(&amm, AssetType::Quote, 0, SwapDirection::Add)
                .unwrap();
        assert_eq!((q, b), (amm.quote_asset_reserve, amm.base_asset_reserve));
    }

    #[test]
    fn quote_amount_swapped_rounds_against_taker_on_remove() {
        let amm = fixture();
        let before = amm.quote_asset_reserve;
        let after = before + 3 * RESERVE_SCALE;
        let add_amount =
            calculate_quote_asset_amount_swapped(after, before, SwapDirection::Add, amm.peg_multiplier)
                .unwrap();
        let remove_amount =
            calculate_quote_asset_amount_swapped(before, after, SwapDirection::Remove, amm.peg_multiplier)
                .unwrap();
        // same reserve delta, taker pays one scale unit more on the way out
        assert_eq!(add_amount, 450 * QUOTE_SCALE);
        assert_eq!(remove_amount, 450 * QUOTE_SCALE + 1);
    }

    #[test]
    fn terminal_reserves_unwind_the_net_position() {
        let mut amm = fixture();
        assert_eq!(
            calculate_terminal_reserves(&amm).unwrap(),
            (amm.quote_asset_reserve, amm.base_asset_reserve)
        );

        // long pressure: takers removed base, quote sits above terminal
        amm.net_base_asset_amount = 100_000_000 * RESERVE_SCALE as i128;
        amm.base_asset_reserve = 400_000_000 * RESERVE_SCALE;
        amm.quote_asset_reserve = 625_000_000 * RESERVE_SCALE;
        let (terminal_quote, terminal_base) = calculate_terminal_reserves(&amm).unwrap();
        assert_eq!(terminal_base, 500_000_000 * RESERVE_SCALE);
        assert_eq!(terminal_quote, 500_000_000 * RESERVE_SCALE);
        assert_eq!(
            calculate_terminal_price(&amm).unwrap(),
            150 * PRICE_SCALE as u64
        );
    }

    #[test]
    fn swap_direction_routing() {
        assert_eq!(
            swap_direction(AssetType::Base, PositionDirection::Long),
            SwapDirection::Remove
        );
        assert_eq!(
            swap_direction(AssetType::Quote, PositionDirection::Short),
            SwapDirection::Remove
        );
        assert_eq!(
            swap_direction(AssetType::Base, PositionDirection::Short),
            SwapDirection::Add
        );
        assert_eq!(
            swap_direction(AssetType::Quote, PositionDirection::Long),
            SwapDirection::Add
        );
    }
}
