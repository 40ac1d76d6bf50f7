use thiserror::Error;

use crate::types::{AccountId, Side, Timestamp, TokenAmount};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Settlement custody failures. A failed call has moved nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("vault underfunded: needed {needed}, held {held}")]
    VaultUnderfunded {
        needed: TokenAmount,
        held: TokenAmount,
    },

    #[error("custody rejected transfer: {0}")]
    Rejected(String),
}

/// Every variant aborts the whole operation with no ledger change and no fund movement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("position already active for {account} on {side}")]
    PositionAlreadyActive { account: AccountId, side: Side },

    #[error("no active position for {account} on {side}")]
    PositionNotActive { account: AccountId, side: Side },

    #[error("leverage {leverage} outside [{min}, {max}]")]
    InvalidLeverage {
        leverage: TokenAmount,
        min: TokenAmount,
        max: TokenAmount,
    },

    #[error("invalid side: {0}")]
    InvalidSide(String),

    #[error("funding not due until {due} (now {now})")]
    FundingRateNotDue { due: Timestamp, now: Timestamp },

    #[error("position of {account} on {side} is not liquidatable")]
    PositionNotLiquidatable { account: AccountId, side: Side },

    #[error("leverage fee {fee} exceeds margin {margin}")]
    LeverageFeeExceedsMargin {
        fee: TokenAmount,
        margin: TokenAmount,
    },

    #[error("amount must be positive: {0}")]
    InvalidAmount(&'static str),

    #[error("invalid oracle price")]
    InvalidPrice,

    #[error("stale oracle price: published at {published_at}, now {now}, max age {max_age}")]
    StalePrice {
        published_at: Timestamp,
        now: Timestamp,
        max_age: u64,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("math overflow: {0}")]
    MathOverflow(&'static str),

    #[error(transparent)]
    Custody(#[from] CustodyError),
}
