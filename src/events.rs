use crate::services::CloseOutcome;
use crate::types::{AccountId, Side, Timestamp, TokenAmount};

/// Notifications for external indexers. The engine never reads them back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    PositionOpened {
        account: AccountId,
        margin: TokenAmount,
        /// PRECISION scaled.
        leverage: TokenAmount,
        side: Side,
    },
    PositionClosed {
        account: AccountId,
        margin: TokenAmount,
        amount_out: TokenAmount,
        side: Side,
        outcome: CloseOutcome,
    },
    MarginAdded {
        account: AccountId,
        amount: TokenAmount,
        side: Side,
    },
    FundingPaid {
        funding_fee: TokenAmount,
        next_funding_time: Timestamp,
        /// Paying side.
        side: Side,
    },
}
