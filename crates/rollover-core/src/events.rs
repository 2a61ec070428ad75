//! Event definitions
//!
//! Every mutating strategy operation appends one or more events to the
//! strategy's [`EventLog`], which serves as its audit trail.

use crate::types::{Address, SchemeId, SeriesId, Timestamp, VaultId};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "event"))]
pub enum StrategyEvent {
    /// Share balance moved; `from` is zero on mint, `to` is zero on burn
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },

    RewardsSet {
        scheme: SchemeId,
        reward_token: Address,
        start: Timestamp,
        end: Timestamp,
        rate: u128,
    },

    Claimed {
        scheme: SchemeId,
        user: Address,
        receiver: Address,
        amount: u128,
    },

    NextPoolSet {
        pool: Address,
        series_id: SeriesId,
    },

    PoolStarted {
        pool: Address,
        series_id: SeriesId,
        vault_id: VaultId,
        fy_token_borrowed: u128,
        lp_minted: u128,
    },

    PoolEnded {
        pool: Address,
        series_id: SeriesId,
        base_recovered: u128,
    },

    Invested {
        pool: Address,
        fy_token_borrowed: u128,
        base_supplied: u128,
        lp_minted: u128,
    },

    Divested {
        pool: Address,
        lp_burned: u128,
        fy_token_repaid: u128,
        base_returned: u128,
    },

    PoolCacheSynced {
        base_reserves: u128,
        fy_token_reserves: u128,
        deviated: bool,
    },

    LimitsSet {
        low: u128,
        mid: u128,
        high: u128,
    },

    PoolDeviationRateSet {
        rate: u128,
    },
}

/// Event with the time it was emitted at
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct EventRecord {
    pub timestamp: Timestamp,
    pub event: StrategyEvent,
}

/// Append-only audit log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn emit(&mut self, timestamp: Timestamp, event: StrategyEvent) {
        log::debug!("event at {}: {:?}", timestamp, event);
        self.records.push(EventRecord { timestamp, event });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&StrategyEvent> {
        self.records.last().map(|record| &record.event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take all records out, leaving the log empty
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log() {
        let mut log = EventLog::default();
        assert!(log.is_empty());

        log.emit(1, StrategyEvent::PoolDeviationRateSet { rate: 5 });
        log.emit(2, StrategyEvent::LimitsSet { low: 1, mid: 2, high: 3 });

        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(&StrategyEvent::LimitsSet { low: 1, mid: 2, high: 3 }));

        let drained = log.drain();
        assert_eq!(drained[0].timestamp, 1);
        assert!(log.is_empty());
    }
}
