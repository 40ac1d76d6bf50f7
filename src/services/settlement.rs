use primitive_types::U256;

use crate::error::Result;
use crate::math::position::{is_liquidated_at, margin_value};
use crate::math::shares::pro_rata;
use crate::services::fees::FeesService;
use crate::state::{Position, SideInfo};
use crate::types::{Price, TokenAmount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Price reached the liquidation price; everything is forfeited.
    Liquidated,
    /// Price at or against entry, not liquidated; margin valued linearly.
    Loss,
    /// Price strictly in favor; margin back plus profit and funding shares, minus fee.
    Profit,
}

/// Money movements of one close, computed from a reconciled and refreshed
/// position. Nothing here is applied yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseSettlement {
    pub outcome: CloseOutcome,
    /// Margin at close time, after funding reconciliation.
    pub margin: TokenAmount,
    /// Pushed to the position owner.
    pub payout: TokenAmount,
    /// Pushed to the fee collector.
    pub fee: TokenAmount,
    /// Debited from the own side's `profits`.
    pub profits_claimed: TokenAmount,
    /// Debited from the own side's `funds`.
    pub funds_claimed: TokenAmount,
    /// Credited to the opposite side's `profits`.
    pub forfeited: TokenAmount,
}

/// Three-way close split. `price == liq` is a liquidation, `price == entry` a loss.
pub fn settle_close<F: FeesService>(
    pos: &Position,
    own: &SideInfo,
    price: Price,
    fees: &F,
) -> Result<CloseSettlement> {
    let share_profits = pro_rata(own.profits, pos.active_shares, own.active_shares)?;
    // The position's per-event share of side funds; never more than the side holds.
    let fund_value = pos.funding_earned.min(own.funds);
    let margin = pos.margin;

    if is_liquidated_at(pos, price)? {
        return Ok(CloseSettlement {
            outcome: CloseOutcome::Liquidated,
            margin,
            payout: U256::zero(),
            fee: U256::zero(),
            profits_claimed: U256::zero(),
            funds_claimed: fund_value,
            forfeited: margin + fund_value,
        });
    }

    if pos.key.side.favorable_distance(pos.entry, price).is_zero() {
        let kept = margin_value(pos, price)?.min(margin);
        return Ok(CloseSettlement {
            outcome: CloseOutcome::Loss,
            margin,
            payout: kept + fund_value,
            fee: U256::zero(),
            profits_claimed: U256::zero(),
            funds_claimed: fund_value,
            forfeited: margin - kept,
        });
    }

    let gross = share_profits + fund_value;
    let fee = fees.profit_fee(gross)?;
    Ok(CloseSettlement {
        outcome: CloseOutcome::Profit,
        margin,
        payout: margin + gross - fee,
        fee,
        profits_claimed: share_profits,
        funds_claimed: fund_value,
        forfeited: U256::zero(),
    })
}
