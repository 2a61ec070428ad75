//! # Core Error Types
//!
//! Every failed operation surfaces one of these conditions and leaves the
//! strategy untouched.

use thiserror::Error;

/// Strategy errors shared by the rewards, lifecycle and investment engines
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Mismatched base")]
    MismatchedBase,

    #[error("Mismatched seriesId")]
    MismatchedSeriesId,

    #[error("Limits out of order: low {low}, mid {mid}, high {high}")]
    InvalidLimits { low: u128, mid: u128, high: u128 },

    #[error("Invalid schedule: start {start} after end {end}")]
    InvalidSchedule { start: i64, end: i64 },

    #[error("Mismatched rewards token")]
    MismatchedRewardsToken,

    #[error("Underfunded schedule: needs {required}, available {available}")]
    UnderfundedSchedule { required: u128, available: u128 },

    // ========================================================================
    // Sequencing Errors
    // ========================================================================

    #[error("Next pool not set")]
    NextPoolNotSet,

    #[error("Pool selected")]
    PoolSelected,

    #[error("Pool not selected")]
    PoolNotSelected,

    #[error("Only after maturity")]
    OnlyAfterMaturity,

    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Ongoing rewards")]
    OngoingRewards,

    #[error("Rewards not set")]
    RewardsNotSet,

    #[error("Invalid pool account")]
    InvalidPool,

    // ========================================================================
    // Guard-rail Errors
    // ========================================================================

    #[error("Reserves ratio changed")]
    ReservesRatioChanged,

    #[error("Pool deviated")]
    PoolDeviated,

    // ========================================================================
    // Resource Errors
    // ========================================================================

    #[error("No funds to start with")]
    NoFundsToStart,

    #[error("Insufficient buffer")]
    InsufficientBuffer,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Zero amount")]
    ZeroAmount,

    #[error("Unknown vault")]
    UnknownVault,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, StrategyError>;

impl StrategyError {
    /// Guard-rail refusals are expected under volatile markets; callers such as
    /// the keeper skip the action instead of aborting.
    pub fn is_guard_rail(&self) -> bool {
        matches!(self, Self::ReservesRatioChanged | Self::PoolDeviated)
    }
}
