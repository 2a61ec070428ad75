use std::collections::BTreeMap;

use rollover_core::math::{mul_div, Rounding};
use rollover_core::{Address, AmmPool, CoreResult, MintOutcome, PoolBurn, StrategyError, Timestamp};

/// Constant-proportion pool: liquidity is added and removed pro rata, trades
/// are simulated by rewriting the reserves
#[derive(Debug, Clone)]
pub struct PoolMock {
    pub address: Address,
    pub base: Address,
    pub fy_token: Address,
    pub maturity: Timestamp,
    base_reserves: u128,
    fy_token_reserves: u128,
    total_supply: u128,
    lp_balances: BTreeMap<Address, u128>,
}

impl PoolMock {
    pub fn new(address: Address, base: Address, fy_token: Address, maturity: Timestamp) -> Self {
        Self {
            address,
            base,
            fy_token,
            maturity,
            base_reserves: 0,
            fy_token_reserves: 0,
            total_supply: 0,
            lp_balances: BTreeMap::new(),
        }
    }

    /// Seed initial liquidity from `provider`
    pub fn seed(mut self, provider: Address, base: u128, fy_token: u128) -> CoreResult<Self> {
        self.mint(provider, base, fy_token)?;
        Ok(self)
    }

    /// Overwrite the reserves, as a trade against the pool would
    pub fn set_reserves(&mut self, base: u128, fy_token: u128) {
        self.base_reserves = base;
        self.fy_token_reserves = fy_token;
    }

    /// Sell `base_in` base for the same amount of fyToken
    pub fn sell_base(&mut self, base_in: u128) -> CoreResult<()> {
        let fy_out = base_in.min(self.fy_token_reserves);
        self.base_reserves = self
            .base_reserves
            .checked_add(base_in)
            .ok_or(StrategyError::MathOverflow)?;
        self.fy_token_reserves -= fy_out;
        Ok(())
    }
}

impl AmmPool for PoolMock {
    fn address(&self) -> Address {
        self.address
    }

    fn base(&self) -> Address {
        self.base
    }

    fn fy_token(&self) -> Address {
        self.fy_token
    }

    fn maturity(&self) -> Timestamp {
        self.maturity
    }

    fn get_reserves(&self) -> (u128, u128) {
        (self.base_reserves, self.fy_token_reserves)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn balance_of(&self, holder: Address) -> u128 {
        self.lp_balances.get(&holder).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> CoreResult<()> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(StrategyError::InsufficientBalance);
        }
        self.lp_balances.insert(from, from_balance - amount);
        *self.lp_balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn mint(&mut self, to: Address, base_in: u128, fy_token_in: u128) -> CoreResult<MintOutcome> {
        let outcome = if self.total_supply == 0 {
            MintOutcome {
                base_used: base_in,
                fy_token_used: fy_token_in,
                lp_minted: base_in,
            }
        } else {
            let supply = self.total_supply;
            let by_base = (self.base_reserves > 0)
                .then(|| mul_div(base_in, supply, self.base_reserves, Rounding::Down))
                .transpose()?;
            let by_fy = (self.fy_token_reserves > 0)
                .then(|| mul_div(fy_token_in, supply, self.fy_token_reserves, Rounding::Down))
                .transpose()?;
            let lp_minted = match (by_base, by_fy) {
                (Some(b), Some(f)) => b.min(f),
                (Some(b), None) => b,
                (None, Some(f)) => f,
                (None, None) => return Err(StrategyError::InsufficientLiquidity),
            };

            MintOutcome {
                base_used: mul_div(lp_minted, self.base_reserves, supply, Rounding::Up)?.min(base_in),
                fy_token_used: mul_div(lp_minted, self.fy_token_reserves, supply, Rounding::Up)?
                    .min(fy_token_in),
                lp_minted,
            }
        };

        if outcome.lp_minted == 0 {
            return Err(StrategyError::ZeroAmount);
        }

        self.base_reserves += outcome.base_used;
        self.fy_token_reserves += outcome.fy_token_used;
        self.total_supply += outcome.lp_minted;
        *self.lp_balances.entry(to).or_default() += outcome.lp_minted;

        log::trace!("pool {} minted {:?}", self.address, outcome);
        Ok(outcome)
    }

    fn burn(&mut self, from: Address, lp_in: u128) -> CoreResult<PoolBurn> {
        let balance = self.balance_of(from);
        if lp_in > balance {
            return Err(StrategyError::InsufficientLiquidity);
        }

        let burned = PoolBurn {
            base_out: mul_div(lp_in, self.base_reserves, self.total_supply, Rounding::Down)?,
            fy_token_out: mul_div(lp_in, self.fy_token_reserves, self.total_supply, Rounding::Down)?,
        };

        self.base_reserves -= burned.base_out;
        self.fy_token_reserves -= burned.fy_token_out;
        self.total_supply -= lp_in;
        self.lp_balances.insert(from, balance - lp_in);
        Ok(burned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolMock {
        PoolMock::new(
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            Address::from_low_u64(3),
            1_000,
        )
        .seed(Address::from_low_u64(9), 1_000, 500)
        .unwrap()
    }

    #[test]
    fn test_mint_is_pro_rata() {
        let mut pool = pool();
        let to = Address::from_low_u64(4);

        // Base limits the mint, unused fyToken is left over
        let outcome = pool.mint(to, 100, 100).unwrap();
        assert_eq!(outcome.lp_minted, 100);
        assert_eq!(outcome.base_used, 100);
        assert_eq!(outcome.fy_token_used, 50);
        assert_eq!(pool.get_reserves(), (1_100, 550));
        assert_eq!(pool.balance_of(to), 100);
    }

    #[test]
    fn test_burn_returns_share_of_reserves() {
        let mut pool = pool();
        let provider = Address::from_low_u64(9);

        let burned = pool.burn(provider, 500).unwrap();
        assert_eq!(burned, PoolBurn { base_out: 500, fy_token_out: 250 });
        assert_eq!(pool.total_supply(), 500);
        assert_eq!(pool.burn(provider, 501), Err(StrategyError::InsufficientLiquidity));
    }

    #[test]
    fn test_transfer_lp() {
        let mut pool = pool();
        let provider = Address::from_low_u64(9);
        let other = Address::from_low_u64(10);

        pool.transfer(provider, other, 10).unwrap();
        assert_eq!(pool.balance_of(other), 10);
        assert_eq!(
            pool.transfer(other, provider, 11),
            Err(StrategyError::InsufficientBalance)
        );
    }
}
