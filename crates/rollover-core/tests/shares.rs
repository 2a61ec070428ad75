//! # Share Issuance Tests
//!
//! Valuation, minting and burning of strategy shares with and without an
//! active pool.

use rollover_core::*;
use rollover_sim::constants::{alice, bob, series_id, strategy_address, GENESIS, ONE_DAY};
use rollover_sim::helpers::SEED_PROVIDER_ID;
use rollover_sim::{new_strategy, Market};

const DEPOSIT: u128 = 1_000_000;
const MATURITY: Timestamp = GENESIS + 30 * ONE_DAY;

fn market() -> Market {
    let mut market = Market::new();
    market.add_series(1, MATURITY, 3_000_000, 1_000_000).unwrap();
    market
}

fn initialized() -> Strategy {
    let mut strategy = new_strategy(StrategyParams::default()).unwrap();
    strategy.init(alice(), DEPOSIT, Clock::at(GENESIS)).unwrap();
    strategy
}

fn started(market: &mut Market) -> Strategy {
    let mut strategy = initialized();
    strategy
        .set_next_pool(&market.pools[0], &market.ladle, series_id(1), Clock::at(GENESIS))
        .unwrap();
    strategy
        .start_pool(&mut market.accounts(0, GENESIS), 0, u128::MAX)
        .unwrap();
    strategy
}

#[test]
fn test_init_once() {
    let mut strategy = initialized();
    assert!(strategy.is_initialized());
    assert_eq!(strategy.balance_of(&alice()), DEPOSIT);
    assert_eq!(strategy.buffer(), DEPOSIT);
    assert_eq!(
        strategy.events().last(),
        Some(&StrategyEvent::Transfer {
            from: Address::ZERO,
            to: alice(),
            amount: DEPOSIT
        })
    );

    assert_eq!(
        strategy.init(bob(), DEPOSIT, Clock::at(GENESIS)),
        Err(StrategyError::AlreadyInitialized)
    );
}

#[test]
fn test_mint_burn_round_trip() {
    let mut strategy = initialized();
    let mut market = market();
    let supply = strategy.total_supply();

    let shares = strategy
        .mint(&market.ladle_only(GENESIS), bob(), 123_457)
        .unwrap();
    let outcome = strategy
        .burn(&mut market.ladle_only(GENESIS + 1), bob(), bob(), shares)
        .unwrap();

    assert!(123_457 - outcome.base <= 1);
    assert_eq!(outcome.fy_token, 0);
    assert_eq!(outcome.lp, 0);
    assert_eq!(strategy.total_supply(), supply);
    assert!(matches!(
        strategy.events().last(),
        Some(StrategyEvent::Transfer { to, .. }) if to.is_zero()
    ));
}

#[test]
fn test_mint_prices_against_value() {
    let mut market = market();
    let mut strategy = started(&mut market);

    // Pool gained base: every LP is worth more
    market.pools[0].set_reserves(4_750_000, 1_250_000);
    let value = strategy.strategy_value(&market.accounts(0, GENESIS)).unwrap();
    assert_eq!(value, 1_200_000);

    let shares = strategy
        .mint(&market.accounts(0, GENESIS), bob(), 120_000)
        .unwrap();
    assert_eq!(shares, 100_000);

    // Valuing an active position needs the pool account
    assert_eq!(
        strategy.mint(&market.ladle_only(GENESIS), bob(), 1),
        Err(StrategyError::InvalidPool)
    );
}

#[test]
fn test_burn_pays_out_lp() {
    let mut market = market();
    let mut strategy = started(&mut market);

    let outcome = strategy
        .burn(&mut market.accounts(0, GENESIS), alice(), bob(), DEPOSIT / 4)
        .unwrap();
    assert_eq!(outcome.lp, 187_500);
    assert_eq!(outcome.base, 0);
    assert_eq!(strategy.cached(), 562_500);
    assert_eq!(market.pools[0].balance_of(bob()), 187_500);
    assert_eq!(market.pools[0].balance_of(strategy_address()), 562_500);

    assert_eq!(
        strategy.burn(&mut market.accounts(0, GENESIS), bob(), bob(), 1),
        Err(StrategyError::InsufficientBalance)
    );
}

#[test]
fn test_mint_with_lp() {
    let mut market = market();
    let mut strategy = started(&mut market);
    let provider = Address::from_low_u64(SEED_PROVIDER_ID);

    // LP has to reach the strategy first
    assert_eq!(
        strategy.mint_with_lp(&market.accounts(0, GENESIS), bob(), 75_000),
        Err(StrategyError::InsufficientBalance)
    );

    market.pools[0]
        .transfer(provider, strategy_address(), 75_000)
        .unwrap();
    let shares = strategy
        .mint_with_lp(&market.accounts(0, GENESIS), bob(), 75_000)
        .unwrap();
    assert_eq!(shares, 100_000);
    assert_eq!(strategy.cached(), 825_000);
    assert_eq!(strategy.balance_of(&bob()), 100_000);
}

#[test]
fn test_burn_for_base_only_without_pool() {
    let mut market = market();
    let mut strategy = started(&mut market);
    assert_eq!(
        strategy.burn_for_base(alice(), alice(), 1, Clock::at(GENESIS)),
        Err(StrategyError::PoolSelected)
    );

    strategy.end_pool(&mut market.accounts(0, MATURITY)).unwrap();
    let base = strategy
        .burn_for_base(alice(), bob(), DEPOSIT / 2, Clock::at(MATURITY))
        .unwrap();
    assert_eq!(base, DEPOSIT / 2);
    assert_eq!(strategy.buffer(), DEPOSIT / 2);
}

#[test]
fn test_zero_amounts_rejected() {
    let mut strategy = initialized();
    let mut market = market();
    assert_eq!(
        strategy.mint(&market.ladle_only(GENESIS), bob(), 0),
        Err(StrategyError::ZeroAmount)
    );
    assert_eq!(
        strategy.burn(&mut market.ladle_only(GENESIS), alice(), alice(), 0),
        Err(StrategyError::ZeroAmount)
    );
}

#[test]
fn test_mint_refused_when_worthless() {
    let mut market = market();
    let mut strategy = started(&mut market);

    // Pool emptied out, vault equity is nil
    market.pools[0].set_reserves(0, 0);
    assert_eq!(strategy.strategy_value(&market.accounts(0, GENESIS)), Ok(0));

    assert_eq!(
        strategy.mint(&market.accounts(0, GENESIS), bob(), DEPOSIT),
        Err(StrategyError::InsufficientLiquidity)
    );
    assert_eq!(strategy.total_supply(), DEPOSIT);
    assert_eq!(strategy.buffer(), 0);
}
