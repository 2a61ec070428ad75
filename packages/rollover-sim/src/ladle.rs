use std::collections::BTreeMap;

use rollover_core::math::{mul_div, Rounding};
use rollover_core::{
    Address, CoreResult, Ladle, Repaid, Series, SeriesId, StrategyError, Timestamp, VaultId,
};

/// Debt position of one vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultMock {
    pub series_id: SeriesId,
    pub collateral: u128,
    pub debt: u128,
}

/// Vault manager for a single base asset
///
/// Repayments release collateral in proportion to the debt they clear.
#[derive(Debug, Clone)]
pub struct LadleMock {
    pub base: Address,
    series: BTreeMap<SeriesId, Series>,
    vaults: BTreeMap<VaultId, VaultMock>,
    nonce: u64,
}

impl LadleMock {
    pub fn new(base: Address) -> Self {
        Self {
            base,
            series: BTreeMap::new(),
            vaults: BTreeMap::new(),
            nonce: 0,
        }
    }

    pub fn add_series(&mut self, series_id: SeriesId, fy_token: Address, maturity: Timestamp) {
        self.series.insert(
            series_id,
            Series {
                base: self.base,
                fy_token,
                maturity,
            },
        );
    }

    pub fn vault(&self, vault_id: VaultId) -> Option<&VaultMock> {
        self.vaults.get(&vault_id)
    }

    pub fn open_vaults(&self) -> usize {
        self.vaults.len()
    }

    fn vault_mut(&mut self, vault_id: VaultId) -> CoreResult<&mut VaultMock> {
        self.vaults
            .get_mut(&vault_id)
            .ok_or(StrategyError::UnknownVault)
    }

    fn maturity_of(&self, series_id: SeriesId) -> CoreResult<Timestamp> {
        self.series
            .get(&series_id)
            .map(|s| s.maturity)
            .ok_or(StrategyError::MismatchedSeriesId)
    }

    fn settle_debt(&mut self, vault_id: VaultId, amount: u128) -> CoreResult<Repaid> {
        let vault = self.vault_mut(vault_id)?;
        let paid = amount.min(vault.debt);
        let released = if vault.debt == 0 {
            0
        } else {
            mul_div(vault.collateral, paid, vault.debt, Rounding::Down)?
        };

        vault.debt -= paid;
        vault.collateral -= released;
        Ok(Repaid {
            debt_remaining: vault.debt,
            collateral_released: released,
        })
    }
}

impl Ladle for LadleMock {
    fn series(&self, series_id: SeriesId) -> Option<Series> {
        self.series.get(&series_id).copied()
    }

    fn open(&mut self, series_id: SeriesId) -> CoreResult<VaultId> {
        self.maturity_of(series_id)?;
        self.nonce += 1;
        let vault_id = VaultId::from_low_u64(self.nonce);
        self.vaults.insert(
            vault_id,
            VaultMock {
                series_id,
                collateral: 0,
                debt: 0,
            },
        );
        Ok(vault_id)
    }

    fn borrow(&mut self, vault_id: VaultId, collateral: u128, amount: u128) -> CoreResult<()> {
        let vault = self.vault_mut(vault_id)?;
        vault.collateral = vault
            .collateral
            .checked_add(collateral)
            .ok_or(StrategyError::MathOverflow)?;
        vault.debt = vault
            .debt
            .checked_add(amount)
            .ok_or(StrategyError::MathOverflow)?;
        Ok(())
    }

    fn repay(&mut self, vault_id: VaultId, amount: u128) -> CoreResult<Repaid> {
        self.settle_debt(vault_id, amount)
    }

    fn repay_with_base(&mut self, vault_id: VaultId, amount: u128, now: Timestamp) -> CoreResult<Repaid> {
        let series_id = self
            .vaults
            .get(&vault_id)
            .map(|v| v.series_id)
            .ok_or(StrategyError::UnknownVault)?;
        if now < self.maturity_of(series_id)? {
            return Err(StrategyError::OnlyAfterMaturity);
        }
        self.settle_debt(vault_id, amount)
    }

    fn close(&mut self, vault_id: VaultId) -> CoreResult<u128> {
        let vault = self
            .vaults
            .get(&vault_id)
            .ok_or(StrategyError::UnknownVault)?;
        if vault.debt > 0 {
            return Err(StrategyError::InsufficientBalance);
        }
        let collateral = vault.collateral;
        self.vaults.remove(&vault_id);
        Ok(collateral)
    }

    fn redeem(&mut self, series_id: SeriesId, amount: u128, now: Timestamp) -> CoreResult<u128> {
        if now < self.maturity_of(series_id)? {
            return Err(StrategyError::OnlyAfterMaturity);
        }
        Ok(amount)
    }

    fn debt(&self, vault_id: VaultId) -> u128 {
        self.vaults.get(&vault_id).map(|v| v.debt).unwrap_or(0)
    }

    fn collateral(&self, vault_id: VaultId) -> u128 {
        self.vaults.get(&vault_id).map(|v| v.collateral).unwrap_or(0)
    }
}
