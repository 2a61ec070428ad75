//! # Strategy Account
//!
//! State of one rollover strategy and the operations callers drive it with.
//! Operations are split across submodules:
//!
//! - [`lifecycle`]: staging, starting and ending pools
//! - [`invest`]: the deviation guard, leveraged invest and divest, rebalancing
//! - [`value`]: valuation and share issuance
//!
//! Every mutating operation runs inside [`Strategy::transact`]: on error the
//! account is restored to its state before the call, events included.

pub mod invest;
pub mod lifecycle;
pub mod value;

pub use invest::Rebalance;
pub use value::BurnOutcome;

use std::collections::BTreeMap;

use crate::constants::DEFAULT_POOL_DEVIATION_RATE;
use crate::errors::{CoreResult, StrategyError};
use crate::events::{EventLog, StrategyEvent};
use crate::interfaces::{AmmPool, Ladle, RewardsTreasury};
use crate::math::{safe_add_u128, wdiv};
use crate::rewards::RewardsToken;
use crate::types::{
    ActivePool, Address, Clock, Limits, PoolCache, PoolPhase, PoolSlot, PoolState,
    RewardsPerToken, RewardsSchedule, SchemeId, SeriesId, Timestamp, UserRewards, VaultId,
};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Tunable strategy parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct StrategyParams {
    /// Tolerated reserve-ratio drift per second (WAD-scaled)
    pub pool_deviation_rate: u128,
    pub limits: Limits,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            pool_deviation_rate: DEFAULT_POOL_DEVIATION_RATE,
            limits: Limits::default(),
        }
    }
}

/// Collaborators and clock handed to one operation
pub struct Accounts<'a> {
    pub pool: Option<&'a mut dyn AmmPool>,
    pub ladle: &'a mut dyn Ladle,
    pub clock: Clock,
}

impl<'a> Accounts<'a> {
    pub fn new(ladle: &'a mut dyn Ladle, clock: Clock) -> Self {
        Self {
            pool: None,
            ladle,
            clock,
        }
    }

    pub fn with_pool(mut self, pool: &'a mut dyn AmmPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn now(&self) -> Timestamp {
        self.clock.unix_timestamp
    }

    /// The supplied pool, checked against `slot`
    pub(crate) fn pool_for(&self, slot: &PoolSlot) -> CoreResult<&(dyn AmmPool + 'a)> {
        match self.pool.as_deref() {
            Some(pool) if pool.address() == slot.pool => Ok(pool),
            _ => Err(StrategyError::InvalidPool),
        }
    }

    /// The supplied pool, checked against `slot`, and the ladle
    pub(crate) fn pool_and_ladle(
        &mut self,
        slot: &PoolSlot,
    ) -> CoreResult<(&mut (dyn AmmPool + 'a), &mut (dyn Ladle + 'a))> {
        let pool = match self.pool.as_deref_mut() {
            Some(pool) if pool.address() == slot.pool => pool,
            _ => return Err(StrategyError::InvalidPool),
        };
        Ok((pool, &mut *self.ladle))
    }
}

/// A liquidity strategy rolling its funds through fyToken pools
#[derive(Debug, Clone)]
pub struct Strategy {
    address: Address,
    base: Address,
    shares: RewardsToken,
    /// Idle base
    buffer: u128,
    /// Idle fyToken of the current series
    fy_token_balance: u128,
    /// LP tokens of the current pool held by the strategy
    cached: u128,
    pool_state: PoolState,
    pool_cache: PoolCache,
    params: StrategyParams,
    initialized: bool,
    events: EventLog,
}

impl Strategy {
    pub fn new(address: Address, base: Address, params: StrategyParams) -> CoreResult<Self> {
        params.limits.validate()?;
        Ok(Self {
            address,
            base,
            shares: RewardsToken::new(),
            buffer: 0,
            fy_token_balance: 0,
            cached: 0,
            pool_state: PoolState::Idle,
            pool_cache: PoolCache::default(),
            params,
            initialized: false,
            events: EventLog::default(),
        })
    }

    /// Run `op` atomically: a failed operation leaves no trace
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let snapshot = self.clone();
        let result = op(self);
        if let Err(err) = &result {
            log::debug!("strategy {} rolled back: {}", self.address, err);
            *self = snapshot;
        }
        result
    }

    pub(crate) fn emit(&mut self, now: Timestamp, event: StrategyEvent) {
        self.events.emit(now, event);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn limits(&self) -> Limits {
        self.params.limits
    }

    pub fn pool_deviation_rate(&self) -> u128 {
        self.params.pool_deviation_rate
    }

    pub fn buffer(&self) -> u128 {
        self.buffer
    }

    pub fn fy_token_balance(&self) -> u128 {
        self.fy_token_balance
    }

    pub fn cached(&self) -> u128 {
        self.cached
    }

    pub fn pool_state(&self) -> &PoolState {
        &self.pool_state
    }

    pub fn pool_cache(&self) -> PoolCache {
        self.pool_cache
    }

    pub fn phase(&self, now: Timestamp) -> PoolPhase {
        self.pool_state.phase(now)
    }

    pub fn current(&self) -> Option<&ActivePool> {
        self.pool_state.current()
    }

    /// Current pool, zero when none is active
    pub fn pool(&self) -> Address {
        self.current().map(|c| c.slot.pool).unwrap_or(Address::ZERO)
    }

    pub fn fy_token(&self) -> Address {
        self.current().map(|c| c.slot.fy_token).unwrap_or(Address::ZERO)
    }

    pub fn series_id(&self) -> SeriesId {
        self.current().map(|c| c.slot.series_id).unwrap_or(SeriesId::ZERO)
    }

    pub fn vault_id(&self) -> VaultId {
        self.current().map(|c| c.vault_id).unwrap_or(VaultId::ZERO)
    }

    pub fn maturity(&self) -> Option<Timestamp> {
        self.current().map(|c| c.slot.maturity)
    }

    /// Staged pool, zero when none is staged
    pub fn next_pool(&self) -> Address {
        self.pool_state.next().map(|n| n.pool).unwrap_or(Address::ZERO)
    }

    pub fn next_series_id(&self) -> SeriesId {
        self.pool_state
            .next()
            .map(|n| n.series_id)
            .unwrap_or(SeriesId::ZERO)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn shares(&self) -> &RewardsToken {
        &self.shares
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.shares.balance_of(holder)
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Hand the audit log over to the caller, leaving it empty
    pub fn take_events(&mut self) -> EventLog {
        std::mem::take(&mut self.events)
    }

    pub fn rewards_per_token(&self, scheme: SchemeId) -> RewardsPerToken {
        self.shares.rewards_per_token(scheme)
    }

    pub fn rewards(&self, scheme: SchemeId, holder: &Address) -> UserRewards {
        self.shares.rewards(scheme, holder)
    }

    pub fn claimable(&self, scheme: SchemeId, holder: &Address, now: Timestamp) -> CoreResult<u128> {
        self.shares.claimable(scheme, holder, now)
    }

    pub fn claimable_period(&self, scheme: SchemeId, now: Timestamp) -> u128 {
        self.shares.claimable_period(scheme, now)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_limits(&mut self, low: u128, mid: u128, high: u128, clock: Clock) -> CoreResult<()> {
        let limits = Limits::new(low, mid, high)?;
        self.params.limits = limits;
        self.emit(clock.unix_timestamp, StrategyEvent::LimitsSet { low, mid, high });
        Ok(())
    }

    pub fn set_pool_deviation_rate(&mut self, rate: u128, clock: Clock) -> CoreResult<()> {
        self.params.pool_deviation_rate = rate;
        self.emit(clock.unix_timestamp, StrategyEvent::PoolDeviationRateSet { rate });
        Ok(())
    }

    /// Configure or replace the rewards schedule of `scheme`
    pub fn set_rewards(
        &mut self,
        scheme: SchemeId,
        schedule: RewardsSchedule,
        clock: Clock,
    ) -> CoreResult<()> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            s.shares.set_rewards(scheme, schedule, now)?;
            s.emit(
                now,
                StrategyEvent::RewardsSet {
                    scheme,
                    reward_token: schedule.reward_token,
                    start: schedule.start,
                    end: schedule.end,
                    rate: schedule.rate,
                },
            );
            Ok(())
        })
    }

    // ========================================================================
    // Holder Operations
    // ========================================================================

    /// Pay all rewards owed to `holder` out to `to`; returns the total paid
    ///
    /// Nothing is paid unless the treasury can cover every scheme.
    pub fn claim(
        &mut self,
        holder: Address,
        to: Address,
        treasury: &mut dyn RewardsTreasury,
        clock: Clock,
    ) -> CoreResult<u128> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            let payouts = s.shares.claim(holder, now)?;

            // Every payout must be covered before the first one leaves
            let mut owed: BTreeMap<Address, u128> = BTreeMap::new();
            for payout in &payouts {
                let due = owed.entry(payout.reward_token).or_default();
                *due = safe_add_u128(*due, payout.amount)?;
            }
            if owed
                .iter()
                .any(|(token, due)| treasury.balance_of(*token) < *due)
            {
                return Err(StrategyError::InsufficientBalance);
            }

            let mut total = 0u128;
            for payout in payouts {
                treasury.transfer(payout.reward_token, to, payout.amount)?;
                total = total.saturating_add(payout.amount);
                s.emit(
                    now,
                    StrategyEvent::Claimed {
                        scheme: payout.scheme,
                        user: holder,
                        receiver: to,
                        amount: payout.amount,
                    },
                );
            }
            Ok(total)
        })
    }

    /// Move shares between holders
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128, clock: Clock) -> CoreResult<()> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            s.shares.transfer(from, to, amount, now)?;
            s.emit(now, StrategyEvent::Transfer { from, to, amount });
            Ok(())
        })
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Overwrite the reserve cache with the live reserves
    pub(crate) fn sync_pool_cache(&mut self, reserves: (u128, u128), now: Timestamp) {
        self.pool_cache = PoolCache {
            base_reserves: reserves.0,
            fy_token_reserves: reserves.1,
            timestamp: now,
        };
    }

    pub(crate) fn current_or_err(&self) -> CoreResult<ActivePool> {
        self.pool_state
            .current()
            .copied()
            .ok_or(StrategyError::PoolNotSelected)
    }
}

/// Base per fyToken of a reserve pair (WAD-scaled), saturating on empty fyToken
pub fn reserves_ratio(base: u128, fy_token: u128) -> CoreResult<u128> {
    if fy_token == 0 {
        return Ok(u128::MAX);
    }
    wdiv(base, fy_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;

    fn strategy() -> Strategy {
        Strategy::new(
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            StrategyParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_unordered_limits() {
        let params = StrategyParams {
            limits: Limits { low: 5, mid: 1, high: 9 },
            ..StrategyParams::default()
        };
        assert!(matches!(
            Strategy::new(Address::ZERO, Address::ZERO, params),
            Err(StrategyError::InvalidLimits { .. })
        ));
    }

    #[test]
    fn test_set_limits() {
        let mut s = strategy();
        assert!(s.set_limits(3, 2, 1, Clock::at(0)).is_err());
        assert_eq!(s.limits(), Limits::default());
        assert!(s.events().is_empty());

        s.set_limits(1, 2, 3, Clock::at(5)).unwrap();
        assert_eq!(s.limits(), Limits { low: 1, mid: 2, high: 3 });
        assert_eq!(s.events().last(), Some(&StrategyEvent::LimitsSet { low: 1, mid: 2, high: 3 }));
    }

    #[test]
    fn test_transact_rolls_back() {
        let mut s = strategy();
        let result: CoreResult<()> = s.transact(|s| {
            s.buffer = 100;
            s.emit(0, StrategyEvent::PoolDeviationRateSet { rate: 1 });
            Err(StrategyError::ZeroAmount)
        });
        assert_eq!(result, Err(StrategyError::ZeroAmount));
        assert_eq!(s.buffer(), 0);
        assert!(s.events().is_empty());
    }

    #[test]
    fn test_empty_slots_read_zero() {
        let s = strategy();
        assert_eq!(s.pool(), Address::ZERO);
        assert_eq!(s.series_id(), SeriesId::ZERO);
        assert_eq!(s.next_pool(), Address::ZERO);
        assert_eq!(s.phase(0), PoolPhase::Idle);
    }

    #[test]
    fn test_reserves_ratio() {
        assert_eq!(reserves_ratio(2, 1), Ok(2 * WAD));
        assert_eq!(reserves_ratio(1, 0), Ok(u128::MAX));
    }
}
