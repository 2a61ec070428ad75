//! # Collaborator Interfaces
//!
//! The strategy never owns the pools, the vault ladle or the rewards treasury.
//! It reaches them through these traits, one borrow per operation.

use crate::errors::CoreResult;
use crate::types::{Address, SeriesId, Timestamp, VaultId};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Amounts taken by a pool mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct MintOutcome {
    pub base_used: u128,
    pub fy_token_used: u128,
    pub lp_minted: u128,
}

/// Amounts returned by a pool burn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PoolBurn {
    pub base_out: u128,
    pub fy_token_out: u128,
}

/// AMM pool pairing the base asset with one series' fyToken
pub trait AmmPool {
    fn address(&self) -> Address;
    fn base(&self) -> Address;
    fn fy_token(&self) -> Address;
    fn maturity(&self) -> Timestamp;

    /// Live `(base, fy_token)` reserves
    fn get_reserves(&self) -> (u128, u128);

    /// Outstanding LP tokens
    fn total_supply(&self) -> u128;

    /// LP tokens held by `holder`
    fn balance_of(&self, holder: Address) -> u128;

    /// Move LP tokens between holders
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> CoreResult<()>;

    /// Supply up to `base_in` and `fy_token_in` and mint LP to `to`.
    /// Unused amounts stay with the caller.
    fn mint(&mut self, to: Address, base_in: u128, fy_token_in: u128) -> CoreResult<MintOutcome>;

    /// Burn `lp_in` LP held by `from`
    fn burn(&mut self, from: Address, lp_in: u128) -> CoreResult<PoolBurn>;
}

/// Series registered with the ladle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Series {
    pub base: Address,
    pub fy_token: Address,
    pub maturity: Timestamp,
}

/// Result of a debt repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Repaid {
    pub debt_remaining: u128,
    /// Base collateral handed back alongside the repayment
    pub collateral_released: u128,
}

/// Collateralized debt vaults borrowing fyToken against base
pub trait Ladle {
    fn series(&self, series_id: SeriesId) -> Option<Series>;

    fn open(&mut self, series_id: SeriesId) -> CoreResult<VaultId>;

    /// Post `collateral` base and borrow `amount` fyToken
    fn borrow(&mut self, vault_id: VaultId, collateral: u128, amount: u128) -> CoreResult<()>;

    /// Repay with fyToken; never takes more than the outstanding debt
    fn repay(&mut self, vault_id: VaultId, amount: u128) -> CoreResult<Repaid>;

    /// Repay with base, 1:1 once the series has matured
    fn repay_with_base(&mut self, vault_id: VaultId, amount: u128, now: Timestamp) -> CoreResult<Repaid>;

    /// Close a debt-free vault and return its remaining collateral
    fn close(&mut self, vault_id: VaultId) -> CoreResult<u128>;

    /// Redeem matured fyToken for base
    fn redeem(&mut self, series_id: SeriesId, amount: u128, now: Timestamp) -> CoreResult<u128>;

    fn debt(&self, vault_id: VaultId) -> u128;
    fn collateral(&self, vault_id: VaultId) -> u128;
}

/// Holder of reward tokens paying out claims
pub trait RewardsTreasury {
    /// Reward tokens of `token` available for payout
    fn balance_of(&self, token: Address) -> u128;

    fn transfer(&mut self, token: Address, to: Address, amount: u128) -> CoreResult<()>;
}
