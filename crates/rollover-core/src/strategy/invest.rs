//! # Leveraged Investment
//!
//! While a pool is active the strategy can borrow fyToken against base, pair it
//! with base and add the pair to the pool, or unwind some LP back into the
//! buffer. Adding liquidity is refused while the pool's reserves move faster
//! than the configured deviation rate.

use crate::constants::MIN_DEVIATION_WINDOW;
use crate::errors::{CoreResult, StrategyError};
use crate::events::StrategyEvent;
use crate::interfaces::{AmmPool, Repaid};
use crate::math::{abs_diff_u128, mul_div, safe_add_u128, safe_sub_u128, wdiv, Rounding};
use crate::strategy::{reserves_ratio, Accounts, Strategy};
use crate::types::{PoolCache, Timestamp};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Action bringing the buffer back inside its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum Rebalance {
    /// Borrow and invest this much fyToken
    Invest(u128),
    /// Divest this much LP
    Divest(u128),
    Hold,
}

/// Whether reserves drifted from `cache` faster than `rate` per second
pub fn reserves_deviated(
    cache: &PoolCache,
    reserves: (u128, u128),
    rate: u128,
    now: Timestamp,
) -> CoreResult<bool> {
    let cached_ratio = reserves_ratio(cache.base_reserves, cache.fy_token_reserves)?;
    let live_ratio = reserves_ratio(reserves.0, reserves.1)?;

    if cached_ratio == 0 {
        return Ok(live_ratio != 0);
    }

    // A drift too large to represent is a deviation
    let drift = wdiv(abs_diff_u128(live_ratio, cached_ratio), cached_ratio).unwrap_or(u128::MAX);
    let window = now.saturating_sub(cache.timestamp).max(MIN_DEVIATION_WINDOW) as u128;

    Ok(drift / window > rate)
}

/// Refuse a pool mint that would issue no LP, before any vault is touched
///
/// Assumes the pool issues LP pro rata to the scarcer side it is given.
pub(crate) fn ensure_mintable(pool: &dyn AmmPool, base_in: u128, fy_token_in: u128) -> CoreResult<()> {
    let supply = pool.total_supply();
    if supply == 0 {
        return if base_in == 0 {
            Err(StrategyError::ZeroAmount)
        } else {
            Ok(())
        };
    }

    let (base_reserves, fy_reserves) = pool.get_reserves();
    let mut estimate: Option<u128> = None;
    for (amount, reserve) in [(base_in, base_reserves), (fy_token_in, fy_reserves)] {
        if reserve > 0 {
            let lp = mul_div(amount, supply, reserve, Rounding::Down)?;
            estimate = Some(estimate.map_or(lp, |e| e.min(lp)));
        }
    }
    match estimate {
        None => Err(StrategyError::InsufficientLiquidity),
        Some(0) => Err(StrategyError::ZeroAmount),
        Some(_) => Ok(()),
    }
}

impl Strategy {
    /// Check the active pool against the reserve cache, then refresh the cache
    pub fn pool_deviated(&mut self, accounts: &mut Accounts<'_>) -> CoreResult<bool> {
        let now = accounts.now();
        self.transact(|s| {
            let current = s.current_or_err()?;
            let pool = accounts.pool_for(&current.slot)?;
            let reserves = pool.get_reserves();

            let deviated = reserves_deviated(&s.pool_cache, reserves, s.params.pool_deviation_rate, now)?;
            if deviated {
                log::warn!("pool {} deviated from cached reserves", current.slot.pool);
            }

            s.sync_pool_cache(reserves, now);
            s.emit(
                now,
                StrategyEvent::PoolCacheSynced {
                    base_reserves: reserves.0,
                    fy_token_reserves: reserves.1,
                    deviated,
                },
            );
            Ok(deviated)
        })
    }

    /// Borrow `amount` fyToken against as much base, pair it with base in the
    /// pool's proportion and add both to the pool. Returns the LP minted.
    pub fn borrow_and_invest(&mut self, accounts: &mut Accounts<'_>, amount: u128) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            if amount == 0 {
                return Err(StrategyError::ZeroAmount);
            }
            let current = s.current_or_err()?;
            let (pool, ladle) = accounts.pool_and_ladle(&current.slot)?;

            let (base_reserves, fy_reserves) = pool.get_reserves();
            if reserves_deviated(
                &s.pool_cache,
                (base_reserves, fy_reserves),
                s.params.pool_deviation_rate,
                now,
            )? {
                return Err(StrategyError::PoolDeviated);
            }

            let base_in = mul_div(amount, base_reserves, fy_reserves, Rounding::Up)?;
            let required = safe_add_u128(amount, base_in)?;
            if s.buffer < required {
                return Err(StrategyError::InsufficientBuffer);
            }

            ensure_mintable(&*pool, base_in, amount)?;

            ladle.borrow(current.vault_id, amount, amount)?;
            let minted = pool.mint(s.address, base_in, amount)?;

            s.buffer = safe_sub_u128(s.buffer, safe_add_u128(amount, minted.base_used)?)?;
            s.fy_token_balance = safe_add_u128(
                s.fy_token_balance,
                safe_sub_u128(amount, minted.fy_token_used)?,
            )?;
            s.cached = safe_add_u128(s.cached, minted.lp_minted)?;

            let reserves = pool.get_reserves();
            s.sync_pool_cache(reserves, now);

            log::debug!(
                "invested {} fyToken and {} base into {}",
                minted.fy_token_used,
                minted.base_used,
                current.slot.pool
            );
            s.emit(
                now,
                StrategyEvent::Invested {
                    pool: current.slot.pool,
                    fy_token_borrowed: amount,
                    base_supplied: minted.base_used,
                    lp_minted: minted.lp_minted,
                },
            );
            Ok(minted.lp_minted)
        })
    }

    /// Burn `lp_amount` LP and repay the vault with the fyToken received
    ///
    /// Returns the base moved into the buffer.
    pub fn divest_and_repay(&mut self, accounts: &mut Accounts<'_>, lp_amount: u128) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            if lp_amount == 0 {
                return Err(StrategyError::ZeroAmount);
            }
            if lp_amount > s.cached {
                return Err(StrategyError::InsufficientLiquidity);
            }
            let current = s.current_or_err()?;
            let (pool, ladle) = accounts.pool_and_ladle(&current.slot)?;

            s.cached -= lp_amount;
            let burned = pool.burn(s.address, lp_amount)?;

            let debt = ladle.debt(current.vault_id);
            let to_repay = burned.fy_token_out.min(debt);
            let repaid = if to_repay > 0 {
                ladle.repay(current.vault_id, to_repay)?
            } else {
                Repaid::default()
            };

            s.fy_token_balance = safe_add_u128(s.fy_token_balance, burned.fy_token_out - to_repay)?;
            let returned = safe_add_u128(burned.base_out, repaid.collateral_released)?;
            s.buffer = safe_add_u128(s.buffer, returned)?;

            let reserves = pool.get_reserves();
            s.sync_pool_cache(reserves, now);

            log::debug!(
                "divested {} LP from {}: repaid {}, {} base returned",
                lp_amount,
                current.slot.pool,
                to_repay,
                returned
            );
            s.emit(
                now,
                StrategyEvent::Divested {
                    pool: current.slot.pool,
                    lp_burned: lp_amount,
                    fy_token_repaid: to_repay,
                    base_returned: returned,
                },
            );
            Ok(returned)
        })
    }

    /// Action that brings the buffer back to its mid limit
    ///
    /// Invests when the buffer is above `high`, divests when it is below `low`.
    pub fn plan_rebalance(&self, pool: &dyn AmmPool) -> CoreResult<Rebalance> {
        match self.current() {
            Some(current) if current.slot.pool != pool.address() => {
                return Err(StrategyError::InvalidPool)
            }
            Some(_) => {}
            None => return Ok(Rebalance::Hold),
        }

        let limits = self.params.limits;
        let (base_reserves, fy_reserves) = pool.get_reserves();
        let total_reserves = safe_add_u128(base_reserves, fy_reserves)?;
        if total_reserves == 0 {
            return Ok(Rebalance::Hold);
        }

        if self.buffer > limits.high {
            // amount + amount * b / f of base per amount of fyToken
            let excess = self.buffer - limits.mid;
            let amount = mul_div(excess, fy_reserves, total_reserves, Rounding::Down)?;
            return Ok(if amount > 0 {
                Rebalance::Invest(amount)
            } else {
                Rebalance::Hold
            });
        }

        if self.buffer < limits.low {
            // Each LP unwinds into its share of both reserves
            let deficit = limits.mid - self.buffer;
            let lp_supply = pool.total_supply();
            let lp = mul_div(deficit, lp_supply, total_reserves, Rounding::Up)?.min(self.cached);
            return Ok(if lp > 0 {
                Rebalance::Divest(lp)
            } else {
                Rebalance::Hold
            });
        }

        Ok(Rebalance::Hold)
    }
}
