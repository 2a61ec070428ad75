//! # Rewards-Bearing Share Ledger
//!
//! Balances and supply of strategy shares. Every balance change settles the
//! affected holders on every rewards scheme before it is applied.

use std::collections::BTreeMap;

use crate::errors::{CoreResult, StrategyError};
use crate::math::{safe_add_u128, safe_sub_u128};
use crate::rewards::accumulator::RewardScheme;
use crate::types::{Address, RewardsPerToken, RewardsSchedule, SchemeId, Timestamp, UserRewards};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Rewards taken out of one scheme by a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub scheme: SchemeId,
    pub reward_token: Address,
    pub amount: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct RewardsToken {
    balances: BTreeMap<Address, u128>,
    total_supply: u128,
    schemes: BTreeMap<SchemeId, RewardScheme>,
}

impl RewardsToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn scheme(&self, scheme: SchemeId) -> Option<&RewardScheme> {
        self.schemes.get(&scheme)
    }

    /// Configure or replace the schedule of `scheme`
    pub fn set_rewards(
        &mut self,
        scheme: SchemeId,
        schedule: RewardsSchedule,
        now: Timestamp,
    ) -> CoreResult<()> {
        let total_supply = self.total_supply;
        match self.schemes.get_mut(&scheme) {
            Some(existing) => existing.reschedule(schedule, total_supply, now)?,
            None => {
                self.schemes.insert(scheme, RewardScheme::new(schedule)?);
            }
        }
        log::debug!(
            "rewards scheme {} set: rate {} over [{}, {}]",
            scheme.0,
            schedule.rate,
            schedule.start,
            schedule.end
        );
        Ok(())
    }

    /// Settle `holder` on every scheme with their current balance
    pub fn settle(&mut self, holder: Address, now: Timestamp) -> CoreResult<()> {
        if holder.is_zero() {
            return Ok(());
        }
        let balance = self.balance_of(&holder);
        let total_supply = self.total_supply;
        for scheme in self.schemes.values_mut() {
            scheme.settle(holder, balance, total_supply, now)?;
        }
        Ok(())
    }

    pub fn mint(&mut self, to: Address, amount: u128, now: Timestamp) -> CoreResult<()> {
        self.settle(to, now)?;
        let balance = safe_add_u128(self.balance_of(&to), amount)?;
        self.total_supply = safe_add_u128(self.total_supply, amount)?;
        self.balances.insert(to, balance);
        Ok(())
    }

    pub fn burn(&mut self, from: Address, amount: u128, now: Timestamp) -> CoreResult<()> {
        self.settle(from, now)?;
        let balance = safe_sub_u128(self.balance_of(&from), amount)
            .map_err(|_| StrategyError::InsufficientBalance)?;
        self.total_supply = safe_sub_u128(self.total_supply, amount)?;
        self.store_balance(from, balance);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
        now: Timestamp,
    ) -> CoreResult<()> {
        self.settle(from, now)?;
        self.settle(to, now)?;

        let from_balance = safe_sub_u128(self.balance_of(&from), amount)
            .map_err(|_| StrategyError::InsufficientBalance)?;
        self.store_balance(from, from_balance);
        let to_balance = safe_add_u128(self.balance_of(&to), amount)?;
        self.store_balance(to, to_balance);
        Ok(())
    }

    /// Settle `holder` everywhere and take all their rewards out
    ///
    /// Returns the non-zero payouts; the caller hands them to the treasury.
    pub fn claim(&mut self, holder: Address, now: Timestamp) -> CoreResult<Vec<Payout>> {
        if self.schemes.is_empty() {
            return Err(StrategyError::RewardsNotSet);
        }
        self.settle(holder, now)?;

        let mut payouts = Vec::new();
        for (id, scheme) in self.schemes.iter_mut() {
            let amount = scheme.take(&holder)?;
            if amount > 0 {
                payouts.push(Payout {
                    scheme: *id,
                    reward_token: scheme.schedule.reward_token,
                    amount,
                });
            }
        }
        Ok(payouts)
    }

    pub fn rewards_per_token(&self, scheme: SchemeId) -> RewardsPerToken {
        self.schemes
            .get(&scheme)
            .map(|s| s.per_token)
            .unwrap_or_default()
    }

    pub fn rewards(&self, scheme: SchemeId, holder: &Address) -> UserRewards {
        self.schemes
            .get(&scheme)
            .map(|s| s.rewards(holder))
            .unwrap_or_default()
    }

    /// Rewards `holder` could claim from `scheme` at `now`
    pub fn claimable(&self, scheme: SchemeId, holder: &Address, now: Timestamp) -> CoreResult<u128> {
        match self.schemes.get(&scheme) {
            Some(s) => s.claimable(holder, self.balance_of(holder), self.total_supply, now),
            None => Ok(0),
        }
    }

    pub fn claimable_period(&self, scheme: SchemeId, now: Timestamp) -> u128 {
        self.schemes
            .get(&scheme)
            .map(|s| s.claimable_period(now))
            .unwrap_or(0)
    }

    fn store_balance(&mut self, holder: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}
