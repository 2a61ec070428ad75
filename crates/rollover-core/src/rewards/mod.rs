//! # Rewards Engine
//!
//! Time-weighted reward streaming over the strategy's share balances.

pub mod accumulator;
pub mod ledger;

pub use accumulator::RewardScheme;
pub use ledger::{Payout, RewardsToken};
