//! # Rewards Types
//!
//! Schedule, global accumulator and per-holder bookkeeping of a rewards scheme.

use crate::errors::{CoreResult, StrategyError};
use crate::math::{mul_div, safe_mul_u128, Rounding};
use crate::types::ids::{Address, Timestamp};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Emission schedule of one rewards scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct RewardsSchedule {
    pub reward_token: Address,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Total emission per second, shared by all holders
    pub rate: u128,
    /// Funded reward budget left to claim, if tracked
    pub available: Option<u128>,
}

impl RewardsSchedule {
    pub fn validate(&self) -> CoreResult<()> {
        if self.start > self.end {
            return Err(StrategyError::InvalidSchedule {
                start: self.start,
                end: self.end,
            });
        }

        if let Some(available) = self.available {
            let required = self.total_emission()?;
            if available < required {
                return Err(StrategyError::UnderfundedSchedule {
                    required,
                    available,
                });
            }
        }

        Ok(())
    }

    /// Rewards emitted over the whole schedule
    pub fn total_emission(&self) -> CoreResult<u128> {
        let duration = (self.end as i128 - self.start as i128).max(0) as u128;
        safe_mul_u128(self.rate, duration)
    }

    /// Whether accrual is running at `now`
    pub fn is_ongoing(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.end
    }
}

/// Cumulative reward per unit of balance (WAD-scaled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct RewardsPerToken {
    pub accumulated: u128,
    pub last_updated: Timestamp,
}

/// Rewards owed to a holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct UserRewards {
    /// Settled and not yet claimed
    pub accumulated: u128,
    /// Accumulator value at last settlement
    pub checkpoint: u128,
}

impl UserRewards {
    /// Amount owed if the holder kept `balance` since the checkpoint
    pub fn owed(&self, balance: u128, rewards_per_token: u128) -> CoreResult<u128> {
        let delta = rewards_per_token
            .checked_sub(self.checkpoint)
            .ok_or(StrategyError::MathUnderflow)?;
        let earned = mul_div(balance, delta, crate::constants::WAD, Rounding::Down)?;
        self.accumulated
            .checked_add(earned)
            .ok_or(StrategyError::MathOverflow)
    }
}
