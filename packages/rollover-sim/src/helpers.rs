use rollover_core::{Accounts, Clock, CoreResult, Strategy, StrategyParams, Timestamp};

use crate::constants::{base_address, fy_token_address, pool_address, series_id, strategy_address};
use crate::ladle::LadleMock;
use crate::pool::PoolMock;

/// Provider of the liquidity a pool is seeded with
pub const SEED_PROVIDER_ID: u64 = 0x5eed;

/// A ladle and its pools over one base asset
#[derive(Debug, Clone)]
pub struct Market {
    pub ladle: LadleMock,
    pub pools: Vec<PoolMock>,
}

impl Market {
    pub fn new() -> Self {
        Self {
            ladle: LadleMock::new(base_address()),
            pools: Vec::new(),
        }
    }

    /// Register series `n` and seed its pool with the given reserves;
    /// returns the pool's index
    pub fn add_series(
        &mut self,
        n: u32,
        maturity: Timestamp,
        base_reserves: u128,
        fy_token_reserves: u128,
    ) -> CoreResult<usize> {
        self.ladle.add_series(series_id(n), fy_token_address(n), maturity);
        let pool = PoolMock::new(pool_address(n), base_address(), fy_token_address(n), maturity)
            .seed(
                rollover_core::Address::from_low_u64(SEED_PROVIDER_ID),
                base_reserves,
                fy_token_reserves,
            )?;
        self.pools.push(pool);
        Ok(self.pools.len() - 1)
    }

    /// Accounts over pool `index` at `now`
    pub fn accounts(&mut self, index: usize, now: Timestamp) -> Accounts<'_> {
        let Market { ladle, pools } = self;
        let accounts = Accounts::new(ladle, Clock::at(now));
        match pools.get_mut(index) {
            Some(pool) => accounts.with_pool(pool),
            None => accounts,
        }
    }

    /// Accounts with no pool at `now`
    pub fn ladle_only(&mut self, now: Timestamp) -> Accounts<'_> {
        Accounts::new(&mut self.ladle, Clock::at(now))
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh strategy over the simulated base asset
pub fn new_strategy(params: StrategyParams) -> CoreResult<Strategy> {
    Strategy::new(strategy_address(), base_address(), params)
}
