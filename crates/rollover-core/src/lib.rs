//! # Rollover Core - Strategy Accounting
//!
//! This crate contains the accounting engines of a liquidity strategy that rolls
//! its funds through successive fyToken pools. It provides:
//!
//! - A time-weighted reward accumulator streaming a fixed-rate emission to
//!   share holders
//! - The pool lifecycle state machine (stage, start, mature, end)
//! - The leveraged invest / divest loop with its deviation guard
//! - Strategy valuation and proportional share issuance
//!
//! Collaborators (AMM pools, the vault ladle, the rewards treasury) are reached
//! through the traits in [`interfaces`], handed to each operation through
//! [`strategy::Accounts`].
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization for off-chain use

pub mod constants;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod math;
pub mod rewards;
pub mod strategy;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, StrategyError};
pub use events::{EventLog, EventRecord, StrategyEvent};
pub use interfaces::{AmmPool, Ladle, MintOutcome, PoolBurn, Repaid, RewardsTreasury, Series};
pub use rewards::RewardsToken;
pub use strategy::{Accounts, BurnOutcome, Rebalance, Strategy, StrategyParams};
pub use types::*;
