//! Mul-div on 256-bit intermediates
//!
//! Reward-per-token, share pricing and reserve ratios all multiply two 128-bit
//! quantities before dividing. The product is carried in `ethnum::U256` so only
//! the final quotient has to fit back into `u128`.

use ethnum::U256;

use crate::constants::WAD;
use crate::errors::{CoreResult, StrategyError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Compute `a * b / denominator` with the requested rounding
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    if denominator == 0 {
        return Err(StrategyError::DivisionByZero);
    }

    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;
    if rounding == Rounding::Up && product % denominator != U256::ZERO {
        quotient += U256::ONE;
    }

    to_u128(quotient)
}

/// Compute `a * b * c / denominator` rounding down
///
/// Used where two factors (rate and elapsed time) are scaled by a third before
/// the division, and their plain product could already exceed 128 bits.
pub fn mul_mul_div(a: u128, b: u128, c: u128, denominator: u128) -> CoreResult<u128> {
    if denominator == 0 {
        return Err(StrategyError::DivisionByZero);
    }

    let ab = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(StrategyError::MathOverflow)?;
    let abc = ab
        .checked_mul(U256::from(c))
        .ok_or(StrategyError::MathOverflow)?;

    to_u128(abc / U256::from(denominator))
}

/// Divide two values into a WAD-scaled ratio
pub fn wdiv(a: u128, b: u128) -> CoreResult<u128> {
    mul_div(a, WAD, b, Rounding::Down)
}

fn to_u128(value: U256) -> CoreResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(StrategyError::MathOverflow);
    }
    Ok(value.as_u128())
}
