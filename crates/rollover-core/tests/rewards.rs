//! # Rewards Streaming Tests
//!
//! Scenarios over the share ledger's reward accumulator, driven through the
//! strategy's holder operations.

use rollover_core::*;
use rollover_sim::constants::{alice, bob, reward_token, GENESIS};
use rollover_sim::{new_strategy, Market, TreasuryMock};

const DEPOSIT: u128 = 1_000_000;

fn schedule(start: Timestamp, end: Timestamp, rate: u128) -> RewardsSchedule {
    RewardsSchedule {
        reward_token: reward_token(),
        start,
        end,
        rate,
        available: None,
    }
}

fn initialized() -> Strategy {
    let mut strategy = new_strategy(StrategyParams::default()).unwrap();
    strategy.init(alice(), DEPOSIT, Clock::at(GENESIS)).unwrap();
    strategy
}

fn funded_treasury() -> TreasuryMock {
    let mut treasury = TreasuryMock::new();
    treasury.fund(reward_token(), u128::MAX / 2);
    treasury
}

#[test]
fn test_claimable_period_and_amount() {
    let mut strategy = initialized();
    strategy
        .set_rewards(
            SchemeId::DEFAULT,
            schedule(GENESIS, GENESIS + 2_000_000, 1),
            Clock::at(GENESIS),
        )
        .unwrap();

    let now = GENESIS + 1_000_000;
    assert_eq!(strategy.claimable_period(SchemeId::DEFAULT, now), 1_000_000);

    let claimable = strategy.claimable(SchemeId::DEFAULT, &alice(), now).unwrap();
    assert!(claimable <= 1_000_000 && claimable >= 999_999, "claimable {}", claimable);
}

#[test]
fn test_claim_pays_out_once() {
    let mut strategy = initialized();
    let mut treasury = funded_treasury();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 2_000_000, 1), Clock::at(GENESIS))
        .unwrap();

    let now = Clock::at(GENESIS + 1_000_000);
    let paid = strategy.claim(alice(), bob(), &mut treasury, now).unwrap();
    assert!(paid >= 999_999);
    assert_eq!(treasury.received(reward_token(), bob()), paid);
    assert!(matches!(
        strategy.events().last(),
        Some(StrategyEvent::Claimed { amount, .. }) if *amount == paid
    ));

    // Nothing left to claim at the same timestamp
    assert_eq!(strategy.claim(alice(), bob(), &mut treasury, now), Ok(0));
    assert_eq!(strategy.rewards(SchemeId::DEFAULT, &alice()).accumulated, 0);

    // Shares are never touched by a claim
    assert_eq!(strategy.balance_of(&alice()), DEPOSIT);
    assert_eq!(strategy.total_supply(), DEPOSIT);
}

#[test]
fn test_failed_payout_keeps_rewards() {
    let mut strategy = initialized();
    let mut empty = TreasuryMock::new();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 100, 1), Clock::at(GENESIS))
        .unwrap();

    let now = Clock::at(GENESIS + 50);
    let before = strategy.claimable(SchemeId::DEFAULT, &alice(), now.unix_timestamp).unwrap();
    assert_eq!(
        strategy.claim(alice(), alice(), &mut empty, now),
        Err(StrategyError::InsufficientBalance)
    );
    assert_eq!(
        strategy.claimable(SchemeId::DEFAULT, &alice(), now.unix_timestamp),
        Ok(before)
    );
}

#[test]
fn test_claim_without_rewards() {
    let mut strategy = initialized();
    let mut treasury = funded_treasury();
    assert_eq!(
        strategy.claim(alice(), alice(), &mut treasury, Clock::at(GENESIS + 10)),
        Err(StrategyError::RewardsNotSet)
    );
}

#[test]
fn test_minting_does_not_increase_claimable() {
    let mut strategy = initialized();
    let mut market = Market::new();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 1_000, 1), Clock::at(GENESIS))
        .unwrap();

    let now = GENESIS + 500;
    let before = strategy.claimable(SchemeId::DEFAULT, &alice(), now).unwrap();
    strategy.mint(&market.ladle_only(now), alice(), DEPOSIT).unwrap();
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), now), Ok(before));
}

#[test]
fn test_receiving_does_not_increase_claimable() {
    let mut strategy = initialized();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 1_000, 1), Clock::at(GENESIS))
        .unwrap();

    let now = GENESIS + 500;
    strategy.transfer(alice(), bob(), DEPOSIT / 2, Clock::at(now)).unwrap();
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &bob(), now), Ok(0));

    // From here on both hold half the supply
    let later = GENESIS + 700;
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &bob(), later), Ok(100));
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), later), Ok(600));
}

#[test]
fn test_equal_holders_accrue_equally() {
    let mut strategy = initialized();
    let mut market = Market::new();
    strategy.mint(&market.ladle_only(GENESIS), bob(), DEPOSIT).unwrap();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 10_000, 7), Clock::at(GENESIS))
        .unwrap();

    let now = GENESIS + 3_333;
    let a = strategy.claimable(SchemeId::DEFAULT, &alice(), now).unwrap();
    let b = strategy.claimable(SchemeId::DEFAULT, &bob(), now).unwrap();
    assert_eq!(a, b);
    assert!(a + b <= 7 * 3_333);
}

#[test]
fn test_no_schedule_no_rewards() {
    let mut strategy = initialized();
    strategy.transfer(alice(), bob(), 10, Clock::at(GENESIS + 10)).unwrap();
    strategy
        .burn_for_base(alice(), alice(), 10, Clock::at(GENESIS + 20))
        .unwrap();

    assert_eq!(strategy.rewards(SchemeId::DEFAULT, &alice()).accumulated, 0);
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &bob(), GENESIS + 30), Ok(0));
    assert_eq!(strategy.rewards_per_token(SchemeId::DEFAULT).accumulated, 0);
}

#[test]
fn test_schedule_updates() {
    let mut strategy = initialized();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 100, 1), Clock::at(GENESIS))
        .unwrap();
    let events = strategy.events().len();

    assert_eq!(
        strategy.set_rewards(
            SchemeId::DEFAULT,
            schedule(GENESIS + 200, GENESIS + 300, 1),
            Clock::at(GENESIS + 50)
        ),
        Err(StrategyError::OngoingRewards)
    );
    assert_eq!(
        strategy.set_rewards(
            SchemeId(1),
            schedule(GENESIS + 300, GENESIS + 200, 1),
            Clock::at(GENESIS + 50)
        ),
        Err(StrategyError::InvalidSchedule {
            start: GENESIS + 300,
            end: GENESIS + 200
        })
    );
    assert_eq!(strategy.events().len(), events);

    // A finished schedule can be replaced and keeps what was accrued
    strategy
        .set_rewards(
            SchemeId::DEFAULT,
            schedule(GENESIS + 200, GENESIS + 300, 3),
            Clock::at(GENESIS + 150),
        )
        .unwrap();
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), GENESIS + 150), Ok(100));
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), GENESIS + 300), Ok(400));
}

#[test]
fn test_independent_schemes() {
    let mut strategy = initialized();
    let mut treasury = funded_treasury();
    let other_token = Address::from_low_u64(0x07e4);
    treasury.fund(other_token, 1_000);

    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 200, 1), Clock::at(GENESIS))
        .unwrap();
    strategy
        .set_rewards(
            SchemeId(1),
            RewardsSchedule {
                reward_token: other_token,
                start: GENESIS + 50,
                end: GENESIS + 100,
                rate: 2,
                available: Some(100),
            },
            Clock::at(GENESIS),
        )
        .unwrap();

    let now = GENESIS + 150;
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), now), Ok(150));
    assert_eq!(strategy.claimable(SchemeId(1), &alice(), now), Ok(100));

    let paid = strategy.claim(alice(), alice(), &mut treasury, Clock::at(now)).unwrap();
    assert_eq!(paid, 250);
    assert_eq!(treasury.received(other_token, alice()), 100);
    assert_eq!(
        strategy.shares().scheme(SchemeId(1)).unwrap().schedule.available,
        Some(0)
    );
}

#[test]
fn test_underfunded_schedule_rejected() {
    let mut strategy = initialized();
    let mut underfunded = schedule(GENESIS, GENESIS + 100, 2);
    underfunded.available = Some(199);
    assert_eq!(
        strategy.set_rewards(SchemeId::DEFAULT, underfunded, Clock::at(GENESIS)),
        Err(StrategyError::UnderfundedSchedule {
            required: 200,
            available: 199
        })
    );
}

#[test]
fn test_replacing_schedule_keeps_token() {
    let mut strategy = initialized();
    strategy
        .set_rewards(SchemeId::DEFAULT, schedule(GENESIS, GENESIS + 10, 1), Clock::at(GENESIS))
        .unwrap();

    let mut other = schedule(GENESIS + 20, GENESIS + 30, 1);
    other.reward_token = Address::from_low_u64(0xdead);
    assert_eq!(
        strategy.set_rewards(SchemeId::DEFAULT, other, Clock::at(GENESIS + 15)),
        Err(StrategyError::MismatchedRewardsToken)
    );
}

#[test]
fn test_claim_pays_all_schemes_or_none() {
    let mut strategy = initialized();
    let first = Address::from_low_u64(0x0a);
    let second = Address::from_low_u64(0x0b);
    let mut treasury = TreasuryMock::new();
    treasury.fund(first, 1_000);

    for (scheme, token) in [(SchemeId::DEFAULT, first), (SchemeId(1), second)] {
        let mut schedule = schedule(GENESIS, GENESIS + 100, 1);
        schedule.reward_token = token;
        strategy.set_rewards(scheme, schedule, Clock::at(GENESIS)).unwrap();
    }

    // The second token cannot be paid, so neither is
    let now = Clock::at(GENESIS + 100);
    assert_eq!(
        strategy.claim(alice(), alice(), &mut treasury, now),
        Err(StrategyError::InsufficientBalance)
    );
    assert_eq!(treasury.received(first, alice()), 0);
    assert_eq!(treasury.balance(first), 1_000);
    assert_eq!(strategy.claimable(SchemeId::DEFAULT, &alice(), now.unix_timestamp), Ok(100));
    assert_eq!(strategy.claimable(SchemeId(1), &alice(), now.unix_timestamp), Ok(100));

    treasury.fund(second, 1_000);
    assert_eq!(strategy.claim(alice(), alice(), &mut treasury, now), Ok(200));
    assert_eq!(strategy.claim(alice(), alice(), &mut treasury, now), Ok(0));

    // Receipts match what accrued, once
    assert_eq!(treasury.received(first, alice()), 100);
    assert_eq!(treasury.received(second, alice()), 100);
}

#[test]
fn test_claim_checks_total_per_token() {
    let mut strategy = initialized();
    let mut treasury = TreasuryMock::new();
    treasury.fund(reward_token(), 150);

    // Two schemes paying the same token, 100 each
    for scheme in [SchemeId::DEFAULT, SchemeId(1)] {
        strategy
            .set_rewards(scheme, schedule(GENESIS, GENESIS + 100, 1), Clock::at(GENESIS))
            .unwrap();
    }

    let now = Clock::at(GENESIS + 100);
    assert_eq!(
        strategy.claim(alice(), alice(), &mut treasury, now),
        Err(StrategyError::InsufficientBalance)
    );
    assert_eq!(treasury.received(reward_token(), alice()), 0);

    treasury.fund(reward_token(), 50);
    assert_eq!(strategy.claim(alice(), alice(), &mut treasury, now), Ok(200));
    assert_eq!(treasury.balance(reward_token()), 0);
}
