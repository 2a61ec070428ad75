use std::collections::BTreeMap;

use rollover_core::{Address, CoreResult, RewardsTreasury, StrategyError};

/// Reward token balances held for payout, and what each receiver got
#[derive(Debug, Clone, Default)]
pub struct TreasuryMock {
    balances: BTreeMap<Address, u128>,
    received: BTreeMap<(Address, Address), u128>,
}

impl TreasuryMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&mut self, token: Address, amount: u128) {
        *self.balances.entry(token).or_default() += amount;
    }

    pub fn balance(&self, token: Address) -> u128 {
        self.balances.get(&token).copied().unwrap_or(0)
    }

    /// Total of `token` paid to `receiver`
    pub fn received(&self, token: Address, receiver: Address) -> u128 {
        self.received.get(&(token, receiver)).copied().unwrap_or(0)
    }
}

impl RewardsTreasury for TreasuryMock {
    fn balance_of(&self, token: Address) -> u128 {
        self.balance(token)
    }

    fn transfer(&mut self, token: Address, to: Address, amount: u128) -> CoreResult<()> {
        let balance = self.balance(token);
        if balance < amount {
            return Err(StrategyError::InsufficientBalance);
        }
        self.balances.insert(token, balance - amount);
        *self.received.entry((token, to)).or_default() += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_draws_balance() {
        let token = Address::from_low_u64(1);
        let to = Address::from_low_u64(2);
        let mut treasury = TreasuryMock::new();
        treasury.fund(token, 10);

        treasury.transfer(token, to, 4).unwrap();
        assert_eq!(treasury.balance(token), 6);
        assert_eq!(treasury.received(token, to), 4);
        assert_eq!(treasury.transfer(token, to, 7), Err(StrategyError::InsufficientBalance));
    }
}
