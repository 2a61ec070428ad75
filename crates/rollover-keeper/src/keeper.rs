use rollover_core::math::{mul_div, Rounding};
use rollover_core::strategy::reserves_ratio;
use rollover_core::{
    Accounts, Address, AmmPool, Clock, CoreResult, Ladle, PoolPhase, SeriesId, Strategy,
    StrategyError, Timestamp, BPS_DENOMINATOR,
};

use crate::controller::{Action, BufferController};
use crate::error::KeeperResult;

/// Something the keeper did (or would do) to the strategy in one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperAction {
    PoolEnded {
        pool: Address,
        recovered: u128,
    },
    NextPoolStaged {
        pool: Address,
        series_id: SeriesId,
    },
    PoolStarted {
        pool: Address,
        lp_minted: u128,
    },
    Invested {
        fy_token_borrowed: u128,
        lp_minted: u128,
    },
    Divested {
        lp_burned: u128,
        base_returned: u128,
    },
    /// A guard rail refused the action; retried on a later tick
    Skipped {
        reason: StrategyError,
    },
}

/// A pool in the rotation, with the series it trades
#[derive(Debug, Clone)]
pub struct QueuedPool<P> {
    pub series_id: SeriesId,
    pub pool: P,
}

/// Off-chain keeper driving a strategy through its pool rotation
///
/// Owns the pools and the ladle the strategy works against. Each
/// [`tick`](Keeper::tick) ends a matured pool, stages the next one in the
/// rotation, starts it, and rebalances the buffer.
#[derive(Debug, Clone)]
pub struct Keeper<P, L> {
    /// Rotation ordered by maturity
    queue: Vec<QueuedPool<P>>,
    ladle: L,
    controller: BufferController,
    ratio_tolerance_bps: u32,
}

impl<P: AmmPool, L: Ladle> Keeper<P, L> {
    pub fn new(ladle: L, controller: BufferController, ratio_tolerance_bps: u32) -> Self {
        Self {
            queue: Vec::new(),
            ladle,
            controller,
            ratio_tolerance_bps,
        }
    }

    /// Add a pool to the rotation, keeping it ordered by maturity
    pub fn push_pool(&mut self, series_id: SeriesId, pool: P) {
        let maturity = pool.maturity();
        let index = self
            .queue
            .partition_point(|queued| queued.pool.maturity() <= maturity);
        log::debug!("Queued pool {} maturing at {}", pool.address(), maturity);
        self.queue.insert(index, QueuedPool { series_id, pool });
    }

    pub fn queue(&self) -> &[QueuedPool<P>] {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut [QueuedPool<P>] {
        &mut self.queue
    }

    pub fn ladle(&self) -> &L {
        &self.ladle
    }

    pub fn controller(&self) -> &BufferController {
        &self.controller
    }

    pub fn pool(&self, address: Address) -> Option<&P> {
        self.queue
            .iter()
            .map(|queued| &queued.pool)
            .find(|pool| pool.address() == address)
    }

    /// Accounts over the ladle and, if queued, the pool at `address`
    pub fn accounts(&mut self, address: Address, now: Timestamp) -> Accounts<'_> {
        let Keeper { queue, ladle, .. } = self;
        let accounts = Accounts::new(ladle, Clock::at(now));
        match queue
            .iter_mut()
            .map(|queued| &mut queued.pool)
            .find(|pool| pool.address() == address)
        {
            Some(pool) => accounts.with_pool(pool),
            None => accounts,
        }
    }

    /// Run one keeper pass over `strategy` at `now`
    pub fn tick(&mut self, strategy: &mut Strategy, now: Timestamp) -> KeeperResult<Vec<KeeperAction>> {
        let mut actions = Vec::new();

        if strategy.phase(now) == PoolPhase::Matured {
            let pool = strategy.pool();
            let recovered = strategy.end_pool(&mut self.accounts(pool, now))?;
            log::info!("Ended pool {}: recovered {} base", pool, recovered);
            actions.push(KeeperAction::PoolEnded { pool, recovered });
        }

        if strategy.next_pool().is_zero() {
            if let Some(queued) = self.next_queued(strategy, now) {
                let (pool, series_id) = (queued.pool.address(), queued.series_id);
                strategy.set_next_pool(&queued.pool, &self.ladle, series_id, Clock::at(now))?;
                log::info!("Staged pool {} for series {}", pool, series_id);
                actions.push(KeeperAction::NextPoolStaged { pool, series_id });
            }
        }

        if strategy.phase(now) == PoolPhase::NextSet {
            if strategy.buffer() == 0 {
                log::debug!("No buffer to start pool {} with", strategy.next_pool());
            } else {
                let pool = strategy.next_pool();
                let (min_ratio, max_ratio) = self.ratio_bounds(pool)?;
                let result = strategy.start_pool(&mut self.accounts(pool, now), min_ratio, max_ratio);
                if let Some(lp_minted) = guard(result, "start pool", &mut actions)? {
                    log::info!("Started pool {}: {} LP minted", pool, lp_minted);
                    actions.push(KeeperAction::PoolStarted { pool, lp_minted });
                }
            }
        }

        if strategy.phase(now) == PoolPhase::Active {
            self.rebalance(strategy, now, &mut actions)?;
        }

        Ok(actions)
    }

    /// What [`tick`](Keeper::tick) would do, leaving everything untouched
    pub fn preview(&self, strategy: &Strategy, now: Timestamp) -> KeeperResult<Vec<KeeperAction>>
    where
        P: Clone,
        L: Clone,
    {
        let mut keeper = self.clone();
        let mut strategy = strategy.clone();
        keeper.tick(&mut strategy, now)
    }

    fn rebalance(
        &mut self,
        strategy: &mut Strategy,
        now: Timestamp,
        actions: &mut Vec<KeeperAction>,
    ) -> KeeperResult<()> {
        let pool = strategy.pool();
        let plan = match self.pool(pool) {
            Some(live) => strategy.plan_rebalance(live)?,
            None => return Err(StrategyError::InvalidPool.into()),
        };

        let action = self.controller.decide(plan, now);
        let executed = match action {
            Action::Hold => return Ok(()),
            Action::Invest(amount) => {
                let result = strategy.borrow_and_invest(&mut self.accounts(pool, now), amount);
                guard(result, "invest", actions)?.map(|lp_minted| KeeperAction::Invested {
                    fy_token_borrowed: amount,
                    lp_minted,
                })
            }
            Action::Divest(lp) => {
                let result = strategy.divest_and_repay(&mut self.accounts(pool, now), lp);
                guard(result, "divest", actions)?.map(|base_returned| KeeperAction::Divested {
                    lp_burned: lp,
                    base_returned,
                })
            }
        };

        match executed {
            Some(done) => {
                log::info!("Rebalanced: {:?} (buffer now {})", done, strategy.buffer());
                self.controller.record(action, now);
                actions.push(done);
            }
            None => {
                // Refresh the reserve snapshot so the next tick measures from here
                strategy.pool_deviated(&mut self.accounts(pool, now))?;
            }
        }

        Ok(())
    }

    /// First queued pool maturing after both `now` and the current pool
    fn next_queued(&self, strategy: &Strategy, now: Timestamp) -> Option<&QueuedPool<P>> {
        let after = strategy.maturity().map_or(now, |maturity| maturity.max(now));
        let current = strategy.pool();
        self.queue
            .iter()
            .find(|queued| queued.pool.maturity() > after && queued.pool.address() != current)
    }

    /// Live ratio of `pool` widened by the configured tolerance
    fn ratio_bounds(&self, pool: Address) -> KeeperResult<(u128, u128)> {
        let live = self.pool(pool).ok_or(StrategyError::InvalidPool)?;
        let (base_reserves, fy_token_reserves) = live.get_reserves();
        let ratio = reserves_ratio(base_reserves, fy_token_reserves)?;
        let tolerance = mul_div(
            ratio,
            self.ratio_tolerance_bps as u128,
            BPS_DENOMINATOR,
            Rounding::Down,
        )?;
        Ok((ratio.saturating_sub(tolerance), ratio.saturating_add(tolerance)))
    }
}

/// Unwrap `result`, turning guard-rail refusals into a logged skip
fn guard<T>(
    result: CoreResult<T>,
    what: &str,
    actions: &mut Vec<KeeperAction>,
) -> KeeperResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(reason) if reason.is_guard_rail() => {
            log::warn!("Skipping {}: {}", what, reason);
            actions.push(KeeperAction::Skipped { reason });
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
