//! # Pool Lifecycle
//!
//! Stage a pool, start it by levering the buffer into it, and end it after
//! maturity by unwinding the position back into base.

use crate::errors::{CoreResult, StrategyError};
use crate::events::StrategyEvent;
use crate::interfaces::{AmmPool, Ladle};
use crate::math::{mul_div, safe_add_u128, safe_sub_u128, Rounding};
use crate::strategy::invest::ensure_mintable;
use crate::strategy::{reserves_ratio, Accounts, Strategy};
use crate::types::{Clock, PoolCache, PoolSlot, SeriesId};

impl Strategy {
    /// Stage `pool` as the next pool, replacing any staged one
    pub fn set_next_pool(
        &mut self,
        pool: &dyn AmmPool,
        ladle: &dyn Ladle,
        series_id: SeriesId,
        clock: Clock,
    ) -> CoreResult<()> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            if pool.base() != s.base {
                return Err(StrategyError::MismatchedBase);
            }
            let series = ladle
                .series(series_id)
                .ok_or(StrategyError::MismatchedSeriesId)?;
            if series.fy_token != pool.fy_token() {
                return Err(StrategyError::MismatchedSeriesId);
            }
            if series.base != s.base {
                return Err(StrategyError::MismatchedBase);
            }

            let slot = PoolSlot {
                pool: pool.address(),
                fy_token: pool.fy_token(),
                series_id,
                maturity: pool.maturity(),
            };
            s.pool_state = s.pool_state.stage(slot);

            log::info!("next pool {} staged for series {}", slot.pool, series_id);
            s.emit(
                now,
                StrategyEvent::NextPoolSet {
                    pool: slot.pool,
                    series_id,
                },
            );
            Ok(())
        })
    }

    /// Start the staged pool with the whole buffer
    ///
    /// The buffer is split in the pool's reserve proportion: the fyToken share
    /// is borrowed against an equal amount of base collateral, the rest is
    /// supplied as base. The pool's base-per-fyToken ratio must sit within
    /// `[min_ratio, max_ratio]` (WAD-scaled).
    pub fn start_pool(
        &mut self,
        accounts: &mut Accounts<'_>,
        min_ratio: u128,
        max_ratio: u128,
    ) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            let next = *s.pool_state.next().ok_or(StrategyError::NextPoolNotSet)?;
            if s.pool_state.current().is_some() {
                return Err(StrategyError::PoolSelected);
            }
            if s.buffer == 0 {
                return Err(StrategyError::NoFundsToStart);
            }

            let (pool, ladle) = accounts.pool_and_ladle(&next)?;

            let (base_reserves, fy_reserves) = pool.get_reserves();
            let ratio = reserves_ratio(base_reserves, fy_reserves)?;
            if ratio < min_ratio || ratio > max_ratio {
                return Err(StrategyError::ReservesRatioChanged);
            }

            // Split the buffer in the pool's proportion
            let budget = s.buffer;
            let total_reserves = safe_add_u128(base_reserves, fy_reserves)?;
            let fy_to_borrow = if total_reserves == 0 {
                0
            } else {
                mul_div(budget, fy_reserves, total_reserves, Rounding::Down)?
            };
            let base_in = safe_sub_u128(budget, fy_to_borrow)?;

            ensure_mintable(&*pool, base_in, fy_to_borrow)?;

            let vault_id = ladle.open(next.series_id)?;
            if fy_to_borrow > 0 {
                ladle.borrow(vault_id, fy_to_borrow, fy_to_borrow)?;
            }
            let minted = pool.mint(s.address, base_in, fy_to_borrow)?;

            // Unused amounts stay with the strategy
            s.buffer = safe_sub_u128(base_in, minted.base_used)?;
            s.fy_token_balance = safe_add_u128(
                s.fy_token_balance,
                safe_sub_u128(fy_to_borrow, minted.fy_token_used)?,
            )?;
            s.cached = minted.lp_minted;
            s.pool_state = s.pool_state.activate(vault_id)?;

            let reserves = pool.get_reserves();
            s.sync_pool_cache(reserves, now);

            log::info!(
                "pool {} started: borrowed {} fyToken, minted {} LP",
                next.pool,
                fy_to_borrow,
                minted.lp_minted
            );
            s.emit(
                now,
                StrategyEvent::PoolStarted {
                    pool: next.pool,
                    series_id: next.series_id,
                    vault_id,
                    fy_token_borrowed: fy_to_borrow,
                    lp_minted: minted.lp_minted,
                },
            );
            Ok(minted.lp_minted)
        })
    }

    /// End the current pool after maturity
    ///
    /// All LP is burnt. The fyToken obtained, together with any idle fyToken,
    /// repays the vault; a surplus is redeemed for base and a shortfall is
    /// repaid with base. The vault is then closed and its collateral returned
    /// to the buffer. Returns the base recovered.
    ///
    /// Refuses with `InsufficientBuffer`, before touching the pool or the
    /// ladle, when the buffer and the vault collateral together could not
    /// cover the debt the idle fyToken leaves.
    pub fn end_pool(&mut self, accounts: &mut Accounts<'_>) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            let current = s.current_or_err()?;
            if now < current.slot.maturity {
                return Err(StrategyError::OnlyAfterMaturity);
            }

            let (pool, ladle) = accounts.pool_and_ladle(&current.slot)?;

            // Worst case the burn yields no fyToken: the debt the idle fyToken
            // leaves is then paid in base from the buffer and returned collateral
            let vault_id = current.vault_id;
            let debt = ladle.debt(vault_id);
            let worst_shortfall = debt.saturating_sub(s.fy_token_balance);
            if safe_add_u128(s.buffer, ladle.collateral(vault_id))? < worst_shortfall {
                return Err(StrategyError::InsufficientBuffer);
            }

            // Drop the cached LP before handing it to the pool
            let lp = std::mem::take(&mut s.cached);
            let burned = if lp > 0 {
                pool.burn(s.address, lp)?
            } else {
                Default::default()
            };

            let fy_available = safe_add_u128(burned.fy_token_out, s.fy_token_balance)?;
            s.fy_token_balance = 0;

            let mut recovered = burned.base_out;
            let mut shortfall = 0;

            if fy_available >= debt {
                if debt > 0 {
                    let repaid = ladle.repay(vault_id, debt)?;
                    recovered = safe_add_u128(recovered, repaid.collateral_released)?;
                }
                let surplus = fy_available - debt;
                if surplus > 0 {
                    let redeemed = ladle.redeem(current.slot.series_id, surplus, now)?;
                    recovered = safe_add_u128(recovered, redeemed)?;
                }
            } else {
                shortfall = debt - fy_available;
                if fy_available > 0 {
                    let repaid = ladle.repay(vault_id, fy_available)?;
                    recovered = safe_add_u128(recovered, repaid.collateral_released)?;
                    shortfall = repaid.debt_remaining;
                }
                let repaid = ladle.repay_with_base(vault_id, shortfall, now)?;
                recovered = safe_add_u128(recovered, repaid.collateral_released)?;
            }

            let collateral = ladle.close(vault_id)?;
            recovered = safe_add_u128(recovered, collateral)?;

            // The shortfall is paid out of the recovered base first, then the buffer
            if recovered >= shortfall {
                recovered -= shortfall;
            } else {
                s.buffer = safe_sub_u128(s.buffer, shortfall - recovered)?;
                recovered = 0;
            }
            s.buffer = safe_add_u128(s.buffer, recovered)?;

            s.pool_state = s.pool_state.end()?;
            s.pool_cache = PoolCache::default();

            log::info!(
                "pool {} ended: {} base recovered, buffer now {}",
                current.slot.pool,
                recovered,
                s.buffer
            );
            s.emit(
                now,
                StrategyEvent::PoolEnded {
                    pool: current.slot.pool,
                    series_id: current.slot.series_id,
                    base_recovered: recovered,
                },
            );
            Ok(recovered)
        })
    }
}
