//! # Pool Types
//!
//! Slots for the active and staged pools, the lifecycle state, the reserve
//! cache used by the deviation guard, and the buffer limits.

use crate::errors::{CoreResult, StrategyError};
use crate::types::ids::{Address, SeriesId, Timestamp, VaultId};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// A pool the strategy can hold liquidity in, together with its series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PoolSlot {
    pub pool: Address,
    pub fy_token: Address,
    pub series_id: SeriesId,
    pub maturity: Timestamp,
}

/// The pool currently holding the strategy's liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct ActivePool {
    pub slot: PoolSlot,
    /// Vault borrowing the series' fyToken against base collateral
    pub vault_id: VaultId,
}

/// Pool lifecycle state
///
/// `Matured` is not stored: it is an `Active` pool observed at or after its
/// maturity, see [`PoolState::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum PoolState {
    /// No current pool, nothing staged
    #[default]
    Idle,
    /// A pool is staged, none is active
    NextSet { next: PoolSlot },
    /// A pool is active, a rollover may be pre-staged
    Active {
        current: ActivePool,
        next: Option<PoolSlot>,
    },
}

/// Lifecycle phase as seen at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum PoolPhase {
    Idle,
    NextSet,
    Active,
    Matured,
}

impl PoolState {
    pub fn phase(&self, now: Timestamp) -> PoolPhase {
        match self {
            PoolState::Idle => PoolPhase::Idle,
            PoolState::NextSet { .. } => PoolPhase::NextSet,
            PoolState::Active { current, .. } if now >= current.slot.maturity => PoolPhase::Matured,
            PoolState::Active { .. } => PoolPhase::Active,
        }
    }

    pub fn current(&self) -> Option<&ActivePool> {
        match self {
            PoolState::Active { current, .. } => Some(current),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&PoolSlot> {
        match self {
            PoolState::NextSet { next } => Some(next),
            PoolState::Active { next, .. } => next.as_ref(),
            PoolState::Idle => None,
        }
    }

    /// Stage `slot` as the next pool, replacing any staged slot
    pub fn stage(self, slot: PoolSlot) -> PoolState {
        match self {
            PoolState::Idle | PoolState::NextSet { .. } => PoolState::NextSet { next: slot },
            PoolState::Active { current, .. } => PoolState::Active {
                current,
                next: Some(slot),
            },
        }
    }

    /// Promote the staged slot to the current pool
    pub fn activate(self, vault_id: VaultId) -> CoreResult<PoolState> {
        match self {
            PoolState::NextSet { next } => Ok(PoolState::Active {
                current: ActivePool {
                    slot: next,
                    vault_id,
                },
                next: None,
            }),
            PoolState::Active { next: Some(_), .. } => Err(StrategyError::PoolSelected),
            PoolState::Active { next: None, .. } | PoolState::Idle => {
                Err(StrategyError::NextPoolNotSet)
            }
        }
    }

    /// Release the current pool, keeping a pre-staged rollover
    pub fn end(self) -> CoreResult<PoolState> {
        match self {
            PoolState::Active { next: Some(next), .. } => Ok(PoolState::NextSet { next }),
            PoolState::Active { next: None, .. } => Ok(PoolState::Idle),
            PoolState::Idle | PoolState::NextSet { .. } => Err(StrategyError::PoolNotSelected),
        }
    }
}

/// Snapshot of the active pool's reserves at last synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PoolCache {
    pub base_reserves: u128,
    pub fy_token_reserves: u128,
    pub timestamp: Timestamp,
}

/// Idle-buffer thresholds gating automatic invest and divest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Limits {
    pub low: u128,
    pub mid: u128,
    pub high: u128,
}

impl Limits {
    pub fn new(low: u128, mid: u128, high: u128) -> CoreResult<Self> {
        let limits = Self { low, mid, high };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.low > self.mid || self.mid > self.high {
            return Err(StrategyError::InvalidLimits {
                low: self.low,
                mid: self.mid,
                high: self.high,
            });
        }
        Ok(())
    }
}
