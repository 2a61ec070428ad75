//! # Protocol Constants
//!
//! Fixed-point scales and default parameters for the strategy engines.

// ============================================================================
// Mathematical Constants
// ============================================================================

/// 18-decimal fixed-point scale
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

// ============================================================================
// Strategy Defaults
// ============================================================================

/// Default tolerated reserve-ratio drift per second (WAD-scaled, 0.01%/s)
pub const DEFAULT_POOL_DEVIATION_RATE: u128 = WAD / 10_000;

/// Minimum elapsed time used when measuring reserve drift (seconds)
pub const MIN_DEVIATION_WINDOW: i64 = 1;

// ============================================================================
// Identifier Sizes
// ============================================================================

/// Size of an address (20 bytes)
pub const ADDRESS_SIZE: usize = 20;

/// Size of a series identifier (6 bytes)
pub const SERIES_ID_SIZE: usize = 6;

/// Size of a vault identifier (12 bytes)
pub const VAULT_ID_SIZE: usize = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_validity() {
        assert_eq!(WAD, 10u128.pow(18));
        assert!(DEFAULT_POOL_DEVIATION_RATE < WAD);
        assert!(MIN_DEVIATION_WINDOW > 0);
    }
}
