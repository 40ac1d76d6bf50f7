// src/state/position_store.rs

use std::collections::HashMap;

use primitive_types::U256;

use crate::types::{AccountId, Notional, Price, Side, Timestamp, TokenAmount};

/// At most one position per (account, side).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub account: AccountId,
    pub side: Side,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub key: PositionKey,

    /// Settlement tokens backing the position.
    pub margin: TokenAmount,

    /// Notional size, fixed at open.
    pub tokens: Notional,

    /// Bonding-curve weight, fixed at open.
    pub shares: U256,

    /// Currently profit-entitled part of `shares`.
    pub active_shares: U256,

    pub entry: Price,

    /// Opened at exactly the minimum leverage (gross of the leverage fee).
    /// Such a position stays fully entitled while it has margin.
    pub entered_at_min_leverage: bool,

    /// Funding reconciled so far; this position's claim on its side's `funds`.
    pub funding_earned: TokenAmount,

    /// Side counters as of the last reconciliation.
    pub funding_paid_index: U256,
    pub funding_earned_index: U256,

    pub opened_at: Timestamp,

    pub last_updated_at: Timestamp,
}

impl Position {
    pub fn new(
        key: PositionKey,
        margin: TokenAmount,
        tokens: Notional,
        shares: U256,
        entry: Price,
        now: Timestamp,
    ) -> Self {
        Self {
            key,
            margin,
            tokens,
            shares,
            active_shares: U256::zero(),
            entry,
            entered_at_min_leverage: false,
            funding_earned: U256::zero(),
            funding_paid_index: U256::zero(),
            funding_earned_index: U256::zero(),
            opened_at: now,
            last_updated_at: now,
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct PositionStore {
    positions: HashMap<PositionKey, Position>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn get_mut(&mut self, key: &PositionKey) -> Option<&mut Position> {
        self.positions.get_mut(key)
    }

    pub fn contains(&self, key: &PositionKey) -> bool {
        self.positions.contains_key(key)
    }

    /// Insert or overwrite. Callers check for an active position first.
    pub fn upsert(&mut self, position: Position) {
        self.positions.insert(position.key, position);
    }

    pub fn remove(&mut self, key: &PositionKey) -> Option<Position> {
        self.positions.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
