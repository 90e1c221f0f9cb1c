//! Synthetic order book sliced off the curve.
//!
//! With no resting orders the vAMM itself is the book: its open bid/ask
//! capacity is cut into equal base-size slices and each slice is priced
//! at its average execution price along the curve.

use ethnum::U256;

use crate::constants::PRICE_TO_PEG_RATIO;
use crate::math::u256_to_u128;
use crate::state::{Amm, PositionDirection};
use crate::trade::calculate_market_open_bid_ask;
use crate::CurveResult;

/// One synthetic level quoted by the vAMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    /// Average execution price of the slice, in `PRICE_SCALE`.
    pub price: u64,
    /// Slice size in base reserve units.
    pub base_asset_amount: u128,
    /// Taker direction that fills this level.
    pub direction: PositionDirection,
}

/// Lazy walk of one side of the curve, `num_orders` slices deep.
///
/// The reserve cursor advances with every yielded level, so an exhausted
/// book cannot be restarted; build a fresh one per snapshot. Ask prices
/// ascend and bid prices descend as the book drains.
pub struct VammBook {
    cursor_base: u128,
    cursor_quote: u128,
    invariant: U256,
    peg_multiplier: u128,
    slice: u128,
    remaining: u32,
    direction: PositionDirection,
}

impl VammBook {
    /// Ask side: levels a taker buys through. Bounded by the open taker
    /// buy capacity (base reserve down to its configured minimum).
    pub fn asks(amm: &Amm, num_orders: u32) -> CurveResult<Self> {
        let (open_bids, _) = Self::open_capacity(amm)?;
        Ok(Self::new(
            amm,
            open_bids.unsigned_abs(),
            num_orders,
            PositionDirection::Long,
        ))
    }

    /// Bid side: levels a taker sells through. Bounded by the open taker
    /// sell capacity (base reserve up to its configured maximum).
    pub fn bids(amm: &Amm, num_orders: u32) -> CurveResult<Self> {
        let (_, open_asks) = Self::open_capacity(amm)?;
        Ok(Self::new(
            amm,
            open_asks.unsigned_abs(),
            num_orders,
            PositionDirection::Short,
        ))
    }

    fn open_capacity(amm: &Amm) -> CurveResult<(i128, i128)> {
        let step = if amm.order_step_size > 0 {
            Some(u128::from(amm.order_step_size))
        } else {
            None
        };
        calculate_market_open_bid_ask(
            amm.base_asset_reserve,
            amm.min_base_asset_reserve,
            amm.max_base_asset_reserve,
            step,
        )
    }

    fn new(amm: &Amm, capacity: u128, num_orders: u32, direction: PositionDirection) -> Self {
        let slice = if num_orders == 0 {
            0
        } else {
            capacity / u128::from(num_orders)
        };
        Self {
            cursor_base: amm.base_asset_reserve,
            cursor_quote: amm.quote_asset_reserve,
            invariant: U256::from(amm.base_asset_reserve) * U256::from(amm.quote_asset_reserve),
            peg_multiplier: amm.peg_multiplier,
            slice,
            remaining: if slice == 0 { 0 } else { num_orders },
            direction,
        }
    }
}

impl Iterator for VammBook {
    type Item = BookLevel;

    fn next(&mut self) -> Option<BookLevel> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let new_base = match self.direction {
            PositionDirection::Long => self.cursor_base.checked_sub(self.slice)?,
            PositionDirection::Short => self.cursor_base.checked_add(self.slice)?,
        };
        if new_base == 0 {
            return None;
        }
        let new_quote = u256_to_u128(self.invariant / U256::from(new_base)).ok()?;

        let quote_delta = self.cursor_quote.abs_diff(new_quote);
        let price = u256_to_u128(
            U256::from(quote_delta) * U256::from(self.peg_multiplier)
                * U256::from(PRICE_TO_PEG_RATIO)
                / U256::from(self.slice),
        )
        .ok()?;

        self.cursor_base = new_base;
        self.cursor_quote = new_quote;

        Some(BookLevel {
            price: u64::try_from(price).ok()?,
            base_asset_amount: self.slice,
            direction: self.direction,
        })
    }
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
            min_base_asset_reserve: 400_000_000 * RESERVE_SCALE,
            max_base_asset_reserve: 625_000_000 * RESERVE_SCALE,
            ..Amm::default()
        }
    }

    #[test]
    fn asks_ascend_from_the_mark() {
        let amm = fixture();
        let mark = amm.reserve_price().unwrap();
        let levels: Vec<BookLevel> = VammBook::asks(&amm, 5).unwrap().collect();
        assert_eq!(levels.len(), 5);
        assert!(levels[0].price > mark);
        for pair in levels.windows(2) {
            assert!(pair[1].price > pair[0].price);
        }
        for level in &levels {
            assert_eq!(level.base_asset_amount, 20_000_000 * RESERVE_SCALE);
            assert_eq!(level.direction, PositionDirection::Long);
        }
    }

    #[test]
    fn bids_descend_from_the_mark() {
        let amm = fixture();
        let mark = amm.reserve_price().unwrap();
        let levels: Vec<BookLevel> = VammBook::bids(&amm, 5).unwrap().collect();
        assert_eq!(levels.len(), 5);
        assert!(levels[0].price < mark);
        for pair in levels.windows(2) {
            assert!(pair[1].price < pair[0].price);
        }
        for level in &levels {
            assert_eq!(level.base_asset_amount, 25_000_000 * RESERVE_SCALE);
            assert_eq!(level.direction, PositionDirection::Short);
        }
    }

    #[test]
    fn book_is_finite_and_not_restartable() {
        let amm = fixture();
        let mut book = VammBook::asks(&amm, 3).unwrap();
        assert_eq!(book.by_ref().count(), 3);
        assert!(book.next().is_none());
    }

    #[test]
    fn exhausted_capacity_yields_no_levels() {
        let mut amm = fixture();
        amm.min_base_asset_reserve = amm.base_asset_reserve;
        assert_eq!(VammBook::asks(&amm, 5).unwrap().count(), 0);
        // zero orders requested is an empty book, not a division hazard
        assert_eq!(VammBook::bids(&amm, 0).unwrap().count(), 0);
    }
}
