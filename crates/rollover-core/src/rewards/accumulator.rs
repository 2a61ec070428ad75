//! # Reward Accumulator
//!
//! Streams a fixed-rate emission to holders in proportion to balance-time held.
//! A global reward-per-token value grows with elapsed time; each holder keeps a
//! checkpoint of it and settles the difference whenever their balance changes.

use std::collections::BTreeMap;

use crate::constants::WAD;
use crate::errors::{CoreResult, StrategyError};
use crate::math::{elapsed_seconds, mul_mul_div, safe_add_u128, safe_sub_u128};
use crate::types::{Address, RewardsPerToken, RewardsSchedule, Timestamp, UserRewards};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// One emission schedule with its accumulator and holder checkpoints
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct RewardScheme {
    pub schedule: RewardsSchedule,
    pub per_token: RewardsPerToken,
    pub users: BTreeMap<Address, UserRewards>,
}

impl RewardScheme {
    /// Create a scheme whose accrual begins at the schedule start
    pub fn new(schedule: RewardsSchedule) -> CoreResult<Self> {
        schedule.validate()?;
        Ok(Self {
            per_token: RewardsPerToken {
                accumulated: 0,
                last_updated: schedule.start,
            },
            schedule,
            users: BTreeMap::new(),
        })
    }

    /// Replace a finished or not yet started schedule
    ///
    /// The accumulator is brought up to `now` under the old schedule first, so
    /// holders keep everything accrued so far.
    pub fn reschedule(
        &mut self,
        schedule: RewardsSchedule,
        total_supply: u128,
        now: Timestamp,
    ) -> CoreResult<()> {
        if self.schedule.is_ongoing(now) {
            return Err(StrategyError::OngoingRewards);
        }
        if schedule.reward_token != self.schedule.reward_token {
            return Err(StrategyError::MismatchedRewardsToken);
        }
        schedule.validate()?;

        self.update(total_supply, now)?;
        self.schedule = schedule;
        self.per_token.last_updated = schedule.start;
        Ok(())
    }

    /// Seconds of emission not yet folded into the accumulator
    pub fn claimable_period(&self, now: Timestamp) -> u128 {
        let from = self.per_token.last_updated.max(self.schedule.start);
        let to = now.min(self.schedule.end);
        elapsed_seconds(from, to)
    }

    /// Reward-per-token value as of `now`, without storing it
    pub fn pending_per_token(&self, total_supply: u128, now: Timestamp) -> CoreResult<u128> {
        let period = self.claimable_period(now);

        // Emission over an empty supply has no one to go to
        if total_supply == 0 || period == 0 {
            return Ok(self.per_token.accumulated);
        }

        let increment = mul_mul_div(self.schedule.rate, period, WAD, total_supply)?;
        safe_add_u128(self.per_token.accumulated, increment)
    }

    /// Fold the emission up to `now` into the accumulator
    pub fn update(&mut self, total_supply: u128, now: Timestamp) -> CoreResult<u128> {
        let accumulated = self.pending_per_token(total_supply, now)?;
        self.per_token = RewardsPerToken {
            accumulated,
            last_updated: now.max(self.schedule.start),
        };
        Ok(accumulated)
    }

    /// Settle `holder` using the balance they held up to now
    pub fn settle(
        &mut self,
        holder: Address,
        balance: u128,
        total_supply: u128,
        now: Timestamp,
    ) -> CoreResult<()> {
        let rewards_per_token = self.update(total_supply, now)?;
        let user = self.users.entry(holder).or_default();
        user.accumulated = user.owed(balance, rewards_per_token)?;
        user.checkpoint = rewards_per_token;
        Ok(())
    }

    /// Settled rewards of `holder`
    pub fn rewards(&self, holder: &Address) -> UserRewards {
        self.users.get(holder).copied().unwrap_or_default()
    }

    /// Rewards `holder` could claim at `now`
    pub fn claimable(
        &self,
        holder: &Address,
        balance: u128,
        total_supply: u128,
        now: Timestamp,
    ) -> CoreResult<u128> {
        let rewards_per_token = self.pending_per_token(total_supply, now)?;
        self.rewards(holder).owed(balance, rewards_per_token)
    }

    /// Zero the settled rewards of `holder` and return them
    ///
    /// The caller settles first. The funded budget, if tracked, is drawn down.
    pub fn take(&mut self, holder: &Address) -> CoreResult<u128> {
        let amount = match self.users.get_mut(holder) {
            Some(user) => std::mem::take(&mut user.accumulated),
            None => 0,
        };

        if let Some(available) = self.schedule.available.as_mut() {
            *available = safe_sub_u128(*available, amount)
                .map_err(|_| StrategyError::InsufficientBalance)?;
        }

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(start: Timestamp, end: Timestamp, rate: u128) -> RewardsSchedule {
        RewardsSchedule {
            reward_token: Address::from_low_u64(9),
            start,
            end,
            rate,
            available: None,
        }
    }

    #[test]
    fn test_no_accrual_before_start_or_after_end() {
        let mut scheme = RewardScheme::new(schedule(100, 200, 10)).unwrap();

        assert_eq!(scheme.pending_per_token(1, 50), Ok(0));
        assert_eq!(scheme.claimable_period(50), 0);

        scheme.update(1, 150).unwrap();
        assert_eq!(scheme.per_token.accumulated, 500 * WAD);

        // Capped at the end of the schedule
        scheme.update(1, 1_000).unwrap();
        assert_eq!(scheme.per_token.accumulated, 1_000 * WAD);
        assert_eq!(scheme.claimable_period(2_000), 0);
    }

    #[test]
    fn test_zero_supply_forfeits_emission() {
        let mut scheme = RewardScheme::new(schedule(0, 100, 1)).unwrap();
        scheme.update(0, 50).unwrap();
        assert_eq!(scheme.per_token.accumulated, 0);
        assert_eq!(scheme.per_token.last_updated, 50);

        scheme.update(2, 60).unwrap();
        assert_eq!(scheme.per_token.accumulated, 5 * WAD);
    }

    #[test]
    fn test_update_idempotent_within_timestamp() {
        let mut scheme = RewardScheme::new(schedule(0, 100, 3)).unwrap();
        let first = scheme.update(7, 40).unwrap();
        let second = scheme.update(7, 40).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_settle_uses_prior_balance() {
        let mut scheme = RewardScheme::new(schedule(0, 1_000, 1)).unwrap();
        let holder = Address::from_low_u64(1);

        scheme.settle(holder, 0, 10, 0).unwrap();
        // Held 10 of 10 for 100 seconds
        scheme.settle(holder, 10, 10, 100).unwrap();
        assert_eq!(scheme.rewards(&holder).accumulated, 100);

        assert_eq!(scheme.take(&holder), Ok(100));
        assert_eq!(scheme.rewards(&holder).accumulated, 0);
    }

    #[test]
    fn test_reschedule_rules() {
        let mut scheme = RewardScheme::new(schedule(0, 100, 1)).unwrap();

        assert_eq!(
            scheme.reschedule(schedule(200, 300, 1), 1, 50),
            Err(StrategyError::OngoingRewards)
        );

        let mut other = schedule(200, 300, 1);
        other.reward_token = Address::from_low_u64(10);
        assert_eq!(
            scheme.reschedule(other, 1, 150),
            Err(StrategyError::MismatchedRewardsToken)
        );

        scheme.reschedule(schedule(200, 300, 2), 1, 150).unwrap();
        // Old schedule fully accrued, new one not started
        assert_eq!(scheme.per_token.accumulated, 100 * WAD);
        assert_eq!(scheme.per_token.last_updated, 200);
    }

    #[test]
    fn test_take_draws_budget() {
        let mut funded = schedule(0, 10, 1);
        funded.available = Some(10);
        let mut scheme = RewardScheme::new(funded).unwrap();
        let holder = Address::from_low_u64(1);

        scheme.settle(holder, 0, 1, 0).unwrap();
        scheme.settle(holder, 1, 1, 4).unwrap();
        assert_eq!(scheme.take(&holder), Ok(4));
        assert_eq!(scheme.schedule.available, Some(6));
    }
}
