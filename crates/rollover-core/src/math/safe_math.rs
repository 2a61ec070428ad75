//! # Safe Math Operations
//!
//! Overflow-checked arithmetic on amounts and timestamps.

use crate::errors::{CoreResult, StrategyError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };

    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(StrategyError::DivisionByZero);
            }
            Ok(a / b)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, StrategyError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, StrategyError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, StrategyError::MathOverflow);
safe_arith!(div, safe_div_u128, u128);

/// Seconds elapsed between two timestamps, zero when `to` is not after `from`
pub fn elapsed_seconds(from: i64, to: i64) -> u128 {
    if to <= from {
        0
    } else {
        (to as i128 - from as i128) as u128
    }
}

/// Absolute difference of two amounts
pub fn abs_diff_u128(a: u128, b: u128) -> u128 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}
