//! # Valuation and Shares
//!
//! Strategy value in base, and share issuance and redemption against it.

use crate::errors::{CoreResult, StrategyError};
use crate::events::StrategyEvent;
use crate::math::{mul_div, safe_add_u128, safe_sub_u128, Rounding};
use crate::strategy::{Accounts, Strategy};
use crate::types::{Address, Clock};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Assets paid out for burnt shares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct BurnOutcome {
    pub base: u128,
    pub fy_token: u128,
    pub lp: u128,
}

impl Strategy {
    /// Total value in base: buffer, idle fyToken, LP share of the pool
    /// reserves and vault equity. fyToken counts 1:1 with base.
    pub fn strategy_value(&self, accounts: &Accounts<'_>) -> CoreResult<u128> {
        let mut value = safe_add_u128(self.buffer, self.fy_token_balance)?;

        if let Some(current) = self.current() {
            if self.cached > 0 {
                let pool = accounts.pool_for(&current.slot)?;
                let lp_supply = pool.total_supply();
                if lp_supply > 0 {
                    let (base_reserves, fy_reserves) = pool.get_reserves();
                    let reserves = safe_add_u128(base_reserves, fy_reserves)?;
                    let lp_value = mul_div(self.cached, reserves, lp_supply, Rounding::Down)?;
                    value = safe_add_u128(value, lp_value)?;
                }
            }

            let collateral = accounts.ladle.collateral(current.vault_id);
            let debt = accounts.ladle.debt(current.vault_id);
            value = safe_add_u128(value, collateral.saturating_sub(debt))?;
        }

        Ok(value)
    }

    /// First mint, once per strategy
    pub fn init(&mut self, to: Address, deposit: u128, clock: Clock) -> CoreResult<u128> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            if s.initialized || s.shares.total_supply() > 0 {
                return Err(StrategyError::AlreadyInitialized);
            }
            if deposit == 0 {
                return Err(StrategyError::ZeroAmount);
            }

            s.initialized = true;
            s.buffer = safe_add_u128(s.buffer, deposit)?;
            s.mint_shares(to, deposit, now)?;

            log::info!("strategy {} initialized with {} base", s.address, deposit);
            Ok(deposit)
        })
    }

    /// Deposit base for shares priced at the current strategy value
    pub fn mint(&mut self, accounts: &Accounts<'_>, to: Address, deposit: u128) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            if deposit == 0 {
                return Err(StrategyError::ZeroAmount);
            }

            let supply = s.shares.total_supply();
            let minted = if supply == 0 {
                deposit
            } else {
                // Outstanding shares over nothing cannot be priced
                let value = s.strategy_value(accounts)?;
                if value == 0 {
                    return Err(StrategyError::InsufficientLiquidity);
                }
                mul_div(deposit, supply, value, Rounding::Down)?
            };
            if minted == 0 {
                return Err(StrategyError::ZeroAmount);
            }

            s.buffer = safe_add_u128(s.buffer, deposit)?;
            s.mint_shares(to, minted, now)?;
            Ok(minted)
        })
    }

    /// Deposit LP of the current pool for shares
    ///
    /// The LP must already be held by the strategy on top of `cached`.
    pub fn mint_with_lp(&mut self, accounts: &Accounts<'_>, to: Address, lp: u128) -> CoreResult<u128> {
        let now = accounts.now();
        self.transact(|s| {
            if lp == 0 {
                return Err(StrategyError::ZeroAmount);
            }
            let current = s.current_or_err()?;
            let pool = accounts.pool_for(&current.slot)?;

            let held = pool.balance_of(s.address);
            if held < safe_add_u128(s.cached, lp)? {
                return Err(StrategyError::InsufficientBalance);
            }

            let supply = s.shares.total_supply();
            let minted = if supply == 0 || s.cached == 0 {
                lp
            } else {
                mul_div(lp, supply, s.cached, Rounding::Down)?
            };
            if minted == 0 {
                return Err(StrategyError::ZeroAmount);
            }

            s.cached = safe_add_u128(s.cached, lp)?;
            s.mint_shares(to, minted, now)?;
            Ok(minted)
        })
    }

    /// Burn shares of `from` for their pro-rata part of the buffer, the idle
    /// fyToken and the cached LP, all paid to `to`
    pub fn burn(
        &mut self,
        accounts: &mut Accounts<'_>,
        from: Address,
        to: Address,
        shares: u128,
    ) -> CoreResult<BurnOutcome> {
        let now = accounts.now();
        self.transact(|s| {
            if shares == 0 {
                return Err(StrategyError::ZeroAmount);
            }
            let supply = s.shares.total_supply();
            if shares > s.shares.balance_of(&from) {
                return Err(StrategyError::InsufficientBalance);
            }

            let outcome = BurnOutcome {
                base: mul_div(s.buffer, shares, supply, Rounding::Down)?,
                fy_token: mul_div(s.fy_token_balance, shares, supply, Rounding::Down)?,
                lp: mul_div(s.cached, shares, supply, Rounding::Down)?,
            };

            s.burn_shares(from, shares, now)?;
            s.buffer = safe_sub_u128(s.buffer, outcome.base)?;
            s.fy_token_balance = safe_sub_u128(s.fy_token_balance, outcome.fy_token)?;

            if outcome.lp > 0 {
                let current = s.current_or_err()?;
                s.cached = safe_sub_u128(s.cached, outcome.lp)?;
                let (pool, _) = accounts.pool_and_ladle(&current.slot)?;
                pool.transfer(s.address, to, outcome.lp)?;
            }

            Ok(outcome)
        })
    }

    /// Burn shares for base while no pool is active
    pub fn burn_for_base(&mut self, from: Address, to: Address, shares: u128, clock: Clock) -> CoreResult<u128> {
        let now = clock.unix_timestamp;
        self.transact(|s| {
            if s.current().is_some() {
                return Err(StrategyError::PoolSelected);
            }
            if shares == 0 {
                return Err(StrategyError::ZeroAmount);
            }
            if shares > s.shares.balance_of(&from) {
                return Err(StrategyError::InsufficientBalance);
            }

            let supply = s.shares.total_supply();
            let base = mul_div(s.buffer, shares, supply, Rounding::Down)?;
            s.burn_shares(from, shares, now)?;
            s.buffer = safe_sub_u128(s.buffer, base)?;

            log::debug!("{} shares of {} burnt for {} base to {}", shares, from, base, to);
            Ok(base)
        })
    }

    fn mint_shares(&mut self, to: Address, amount: u128, now: i64) -> CoreResult<()> {
        self.shares.mint(to, amount, now)?;
        self.emit(
            now,
            StrategyEvent::Transfer {
                from: Address::ZERO,
                to,
                amount,
            },
        );
        Ok(())
    }

    fn burn_shares(&mut self, from: Address, amount: u128, now: i64) -> CoreResult<()> {
        self.shares.burn(from, amount, now)?;
        self.emit(
            now,
            StrategyEvent::Transfer {
                from,
                to: Address::ZERO,
                amount,
            },
        );
        Ok(())
    }
}
