//! Simulated market the keeper binary runs against: the in-memory pools and
//! ladle from `rollover-sim`, a deposit flow from a second holder, and trade
//! flow drifting each pool's reserves every tick.

use std::collections::BTreeMap;

use rollover_core::{
    Address, AmmPool, Clock, EventLog, PoolPhase, RewardsSchedule, SchemeId, Strategy, Timestamp,
    BPS_DENOMINATOR,
};
use rollover_sim::constants::{alice, bob, pool_address, reward_token, series_id};
use rollover_sim::{new_strategy, LadleMock, Market, PoolMock, TreasuryMock};
use serde::Serialize;

use crate::config::KeeperConfig;
use crate::controller::BufferController;
use crate::error::KeeperResult;
use crate::keeper::{Keeper, KeeperAction};

/// End-of-run snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub now: Timestamp,
    pub steps: u64,
    pub phase: PoolPhase,
    pub pool: Address,
    pub buffer: u128,
    pub fy_token_balance: u128,
    pub cached: u128,
    pub value: u128,
    pub total_supply: u128,
    pub rewards_claimed: u128,
    pub rebalances: u64,
    pub rebalances_held: u64,
}

pub struct Simulation {
    config: KeeperConfig,
    strategy: Strategy,
    keeper: Keeper<PoolMock, LadleMock>,
    treasury: TreasuryMock,
    /// Reserve drift per tick, by pool
    drifts: BTreeMap<Address, i32>,
    now: Timestamp,
    steps: u64,
    rewards_claimed: u128,
    dry_run: bool,
}

impl Simulation {
    /// Build the market, initialize the strategy with the configured deposit
    /// and start the rewards stream
    pub fn new(config: KeeperConfig, dry_run: bool) -> KeeperResult<Self> {
        config.validate()?;
        let start = config.simulation.start();
        let clock = Clock::at(start);

        let mut market = Market::new();
        let mut drifts = BTreeMap::new();
        for series in &config.simulation.series {
            market.add_series(
                series.id,
                start + series.maturity_offset,
                series.base_reserves as u128,
                series.fy_token_reserves as u128,
            )?;
            if series.drift_bps != 0 {
                drifts.insert(pool_address(series.id), series.drift_bps);
            }
        }

        let Market { ladle, pools } = market;
        let mut keeper = Keeper::new(
            ladle,
            BufferController::new(config.strategy.min_action_interval),
            config.strategy.ratio_tolerance_bps,
        );
        for (series, pool) in config.simulation.series.iter().zip(pools) {
            keeper.push_pool(series_id(series.id), pool);
        }

        let mut strategy = new_strategy(config.strategy.params()?)?;
        strategy.init(alice(), config.simulation.initial_deposit as u128, clock)?;

        let mut treasury = TreasuryMock::new();
        if let Some(rewards) = &config.rewards {
            let schedule = RewardsSchedule {
                reward_token: reward_token(),
                start,
                end: start + rewards.duration,
                rate: rewards.rate as u128,
                available: rewards.budget.map(u128::from),
            };
            strategy.set_rewards(SchemeId::DEFAULT, schedule, clock)?;
            treasury.fund(reward_token(), schedule.total_emission()?);
        }

        log::info!(
            "Simulation starts at {} with {} series, deposit {}",
            start,
            config.simulation.series.len(),
            config.simulation.initial_deposit
        );

        Ok(Self {
            config,
            strategy,
            keeper,
            treasury,
            drifts,
            now: start,
            steps: 0,
            rewards_claimed: 0,
            dry_run,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn keeper(&self) -> &Keeper<PoolMock, LadleMock> {
        &self.keeper
    }

    pub fn treasury(&self) -> &TreasuryMock {
        &self.treasury
    }

    /// Apply one tick of market flow, run the keeper, and advance the clock
    pub fn step(&mut self) -> KeeperResult<Vec<KeeperAction>> {
        self.apply_flow()?;

        let actions = if self.dry_run {
            let planned = self.keeper.preview(&self.strategy, self.now)?;
            for action in &planned {
                log::info!("DRY RUN: would apply {:?}", action);
            }
            planned
        } else {
            self.keeper.tick(&mut self.strategy, self.now)?
        };

        self.now += self.config.simulation.step_seconds;
        self.steps += 1;
        Ok(actions)
    }

    /// Hand over the strategy's audit log
    pub fn take_events(&mut self) -> EventLog {
        self.strategy.take_events()
    }

    /// Claim the initial depositor's rewards, if a stream was configured
    pub fn claim_rewards(&mut self) -> KeeperResult<u128> {
        if self.config.rewards.is_none() {
            return Ok(0);
        }
        let paid = self
            .strategy
            .claim(alice(), alice(), &mut self.treasury, Clock::at(self.now))?;
        self.rewards_claimed += paid;
        Ok(paid)
    }

    pub fn summary(&mut self) -> KeeperResult<Summary> {
        let now = self.now;
        let pool = self.strategy.pool();
        let value = self
            .strategy
            .strategy_value(&self.keeper.accounts(pool, now))?;
        let controller = self.keeper.controller().get_state();

        Ok(Summary {
            now,
            steps: self.steps,
            phase: self.strategy.phase(now),
            pool,
            buffer: self.strategy.buffer(),
            fy_token_balance: self.strategy.fy_token_balance(),
            cached: self.strategy.cached(),
            value,
            total_supply: self.strategy.total_supply(),
            rewards_claimed: self.rewards_claimed,
            rebalances: controller.actions,
            rebalances_held: controller.held,
        })
    }

    /// Trade flow on every unmatured pool, then the per-tick deposit
    fn apply_flow(&mut self) -> KeeperResult<()> {
        let now = self.now;
        for queued in self.keeper.queue_mut() {
            let pool = &mut queued.pool;
            let drift = match self.drifts.get(&pool.address()) {
                Some(&drift) if now < pool.maturity() => drift,
                _ => continue,
            };

            let (base, fy_token) = pool.get_reserves();
            let delta = base * drift.unsigned_abs() as u128 / BPS_DENOMINATOR;
            if drift > 0 {
                pool.sell_base(delta)?;
            } else {
                pool.set_reserves(base - delta, fy_token);
            }
        }

        let deposit = self.config.simulation.deposit_per_step as u128;
        if deposit > 0 && !self.dry_run {
            let pool = self.strategy.pool();
            let shares = self
                .strategy
                .mint(&self.keeper.accounts(pool, now), bob(), deposit)?;
            log::debug!("Deposit of {} base minted {} shares", deposit, shares);
        }

        Ok(())
    }
}
