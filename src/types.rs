// src/types.rs
use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::Deserialize;

use crate::error::EngineError;

/// Fixed-point scale for leverage, funding rates and cumulative indices (1e8).
pub const PRECISION: u64 = 100_000_000;

/// Basis point denominator.
pub const BPS_DENOM: u64 = 10_000;

pub const SECONDS_PER_DAY: u64 = 86_400;

pub fn precision() -> U256 {
    U256::from(PRECISION)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SignedU256 {
    pub is_negative: bool,
    pub mag: U256,
}

impl SignedU256 {
    pub fn pos(mag: U256) -> Self {
        Self {
            is_negative: false,
            mag,
        }
    }
    pub fn neg(mag: U256) -> Self {
        // no negative zero
        Self {
            is_negative: !mag.is_zero(),
            mag,
        }
    }
    pub fn is_zero(&self) -> bool {
        self.mag.is_zero()
    }
}

pub type Timestamp = u64;

/// Settlement-token amount (margin, payouts, fees, funds, profits).
pub type TokenAmount = U256;

/// Notional size in the underlying unit.
pub type Notional = U256;

/// Oracle price after clamping to non-negative.
pub type Price = U256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        f.write_str("..")
    }
}

/// The two pools. Each side is the other's counterparty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Short,
    Long,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Short, Side::Long];

    pub fn opposite(self) -> Side {
        match self {
            Side::Short => Side::Long,
            Side::Long => Side::Short,
        }
    }

    /// Moves `price` by `delta` in the direction that loses money for this side.
    pub fn against(self, price: Price, delta: U256) -> Price {
        match self {
            Side::Short => price.saturating_add(delta),
            Side::Long => price.saturating_sub(delta),
        }
    }

    /// Moves `price` by `delta` in the direction that makes money for this side.
    pub fn toward(self, price: Price, delta: U256) -> Price {
        self.opposite().against(price, delta)
    }

    /// How far `price` has moved from `entry` against this side; zero if it moved in favor.
    pub fn adverse_distance(self, entry: Price, price: Price) -> U256 {
        match self {
            Side::Short => price.saturating_sub(entry),
            Side::Long => entry.saturating_sub(price),
        }
    }

    /// How far `price` has moved from `entry` in favor of this side; zero if it moved against.
    pub fn favorable_distance(self, entry: Price, price: Price) -> U256 {
        self.opposite().adverse_distance(entry, price)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Short => f.write_str("short"),
            Side::Long => f.write_str("long"),
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = EngineError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Side::Short),
            1 => Ok(Side::Long),
            other => Err(EngineError::InvalidSide(other.to_string())),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Side::Short),
            "long" => Ok(Side::Long),
            _ => Err(EngineError::InvalidSide(s.to_string())),
        }
    }
}

/// Raw oracle reading. Negative prices are possible on the wire and are clamped to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceReading {
    pub price: i128,
    pub published_at: Timestamp,
}

impl PriceReading {
    pub fn clamped(&self) -> Price {
        if self.price <= 0 {
            U256::zero()
        } else {
            U256::from(self.price as u128)
        }
    }
}
