use crate::error::Result;
use crate::math::position::{break_even_price, is_liquidated_at, liquidation_price};
use crate::state::Position;
use crate::types::{Price, TokenAmount};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiquidationPreview {
    pub price: Price,
    /// Margin after pending funding.
    pub margin: TokenAmount,
    pub liquidation_price: Price,
    pub break_even_price: Price,
    pub is_liquidatable: bool,
}

/// `pos` must already be reconciled against funding; pending funding moves both
/// thresholds toward entry.
pub fn preview(pos: &Position, price: Price) -> Result<LiquidationPreview> {
    Ok(LiquidationPreview {
        price,
        margin: pos.margin,
        liquidation_price: liquidation_price(pos)?,
        break_even_price: break_even_price(pos)?,
        is_liquidatable: is_liquidated_at(pos, price)?,
    })
}
