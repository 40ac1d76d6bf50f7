// src/state/funding_state.rs
use crate::types::*;

/// Global funding schedule. Per-side accumulators live on `SideInfo`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FundingState {
    /// Earliest time the next funding event may run.
    pub funding_due: Timestamp,
    /// Time of the last event that actually ran.
    pub last_funded_at: Timestamp,
    /// Number of events run, transfers or not.
    pub events: u64,
}

impl FundingState {
    pub fn starting_at(now: Timestamp, interval_secs: u64) -> Self {
        Self {
            funding_due: now.saturating_add(interval_secs),
            last_funded_at: 0,
            events: 0,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.funding_due
    }
}
