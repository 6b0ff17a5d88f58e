//! BalanceCache - last fetched balance, or unknown
//!
//! Populated only by an explicit fetch. Any mutating operation clears it, so a
//! value that is shown is never older than the last write.

use crate::units::{EthAmount, UnitsError};
use alloy_primitives::U256;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "eth", rename_all = "lowercase")]
pub enum BalanceSnapshot {
    #[default]
    Unknown,
    Known(EthAmount),
}

impl BalanceSnapshot {
    pub fn is_unknown(&self) -> bool { matches!(self, BalanceSnapshot::Unknown) }

    pub fn value(&self) -> Option<EthAmount> {
        match self {
            BalanceSnapshot::Known(v) => Some(*v),
            BalanceSnapshot::Unknown => None,
        }
    }
}

impl fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceSnapshot::Known(v) => write!(f, "{}", v),
            BalanceSnapshot::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BalanceCache {
    snapshot: BalanceSnapshot,
    decimals: u8,
    epoch: u64,
}

impl BalanceCache {
    pub fn new(decimals: u8) -> Self { Self { snapshot: BalanceSnapshot::Unknown, decimals, epoch: 0 } }

    pub fn get(&self) -> BalanceSnapshot { self.snapshot }

    /// Bumped by every invalidation. A read started under an older epoch may be stale.
    pub fn epoch(&self) -> u64 { self.epoch }

    /// Set from a freshly read raw value. Returns `false` (and keeps the
    /// existing value) when a racing fetch already populated the cache.
    pub fn populate(&mut self, raw: U256) -> Result<bool, UnitsError> {
        if !self.snapshot.is_unknown() {
            return Ok(false);
        }
        self.snapshot = BalanceSnapshot::Known(EthAmount::from_raw(raw, self.decimals)?);
        Ok(true)
    }

    /// As [`populate`](Self::populate), but drops values read before the last invalidation.
    pub fn populate_for(&mut self, epoch: u64, raw: U256) -> Result<bool, UnitsError> {
        if epoch != self.epoch {
            return Ok(false);
        }
        self.populate(raw)
    }

    pub fn invalidate(&mut self) {
        self.snapshot = BalanceSnapshot::Unknown;
        self.epoch += 1;
    }
}
