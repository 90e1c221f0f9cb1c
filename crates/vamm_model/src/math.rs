//! Wide-integer helpers backing the curve math.
//!
//! Intermediate products of reserve-scaled values exceed 128 bits, so the
//! model computes through 256-bit integers and casts back down at the end.

use ethnum::{I256, U256};
use integer_sqrt::IntegerSquareRoot;

use crate::{CurveError, CurveResult};

/// Checked narrowing between integer types; `InvalidConversion` on loss.
pub(crate) fn cast<T, U>(v: T) -> CurveResult<U>
where
    U: TryFrom<T>,
{
    U::try_from(v).map_err(|_| CurveError::InvalidConversion)
}

pub(crate) fn u256_to_u128(v: U256) -> CurveResult<u128> {
    if v > U256::from(u128::MAX) {
        return Err(CurveError::Overflow);
    }
    Ok(v.as_u128())
}

pub(crate) fn i256_to_i128(v: I256) -> CurveResult<i128> {
    if v > I256::from(i128::MAX) || v < I256::from(i128::MIN) {
        return Err(CurveError::Overflow);
    }
    Ok(v.as_i128())
}

/// Integer square root of a 256-bit value. Values in u128 range take the
/// library root; wider values run Newton's iteration seeded from a
/// power-of-two upper bound.
pub(crate) fn sqrt_u256(v: U256) -> U256 {
    if v <= U256::from(u128::MAX) {
        return U256::from(v.as_u128().integer_sqrt());
    }
    let bits = 256 - v.leading_zeros();
    let mut x = U256::ONE << bits.div_ceil(2);
    loop {
        let next = (x + v / x) >> 1;
        if next >= x {
            break;
        }
        x = next;
    }
    x
}

/// Ceiling division; `DivisionByZero` on a zero denominator.
pub fn ceil_div(numerator: u128, denominator: u128) -> CurveResult<u128> {
    if denominator == 0 {
        return Err(CurveError::DivisionByZero);
    }
    Ok(numerator / denominator + u128::from(numerator % denominator != 0))
}

/// Clamp `value` into `[low, high]`. Total even when the bounds cross
/// (negative band centers invert them); the high bound wins then.
pub fn clamp(value: i64, low: i64, high: i64) -> i64 {
    high.min(value.max(low))
}

/// Checked conversion of a non-negative float into a scaled integer.
/// Rejects NaN, infinities, negatives, and values whose scaled
/// magnitude does not fit in `u128`.
pub fn f64_to_scaled(value: f64, scale: u128) -> CurveResult<u128> {
    if !value.is_finite() || value < 0.0 {
        return Err(CurveError::InvalidConversion);
    }
    let scaled = value * scale as f64;
    if scaled >= u128::MAX as f64 {
        return Err(CurveError::InvalidConversion);
    }
    Ok(scaled as u128)
}

/// Shrink a ratio by common powers of ten until both legs fit in `i128`.
///
/// Loses at most one decimal digit of precision per shrink, which is
/// acceptable for the K-scaling controller that consumes it.
pub(crate) fn reduce_ratio(mut numerator: I256, mut denominator: I256) -> CurveResult<(i128, i128)> {
    let ten = I256::from(10i8);
    let max = I256::from(i128::MAX);
    let min = I256::from(i128::MIN);
    while numerator > max || numerator < min || denominator > max || denominator < min {
        numerator /= ten;
        denominator /= ten;
        if denominator == I256::ZERO {
            return Err(CurveError::DivisionByZero);
        }
    }
    Ok((numerator.as_i128(), denominator.as_i128()))
}
