use primitive_types::U256;

use crate::error::Result;
use crate::math::rounding::{mul_div, mul_div_round, Rounding};
use crate::state::Position;
use crate::types::{precision, Notional, Price, TokenAmount};

/// Price distance the margin can absorb: entry * margin / tokens.
///
/// Both the liquidation price and the break-even price sit this far from entry,
/// on opposite sides of it.
pub fn margin_offset(entry: Price, margin: TokenAmount, tokens: Notional) -> Result<U256> {
    mul_div(entry, margin, tokens)
}

/// SHORT: entry + offset, LONG: entry - offset (floored at zero).
pub fn liquidation_price(pos: &Position) -> Result<Price> {
    let offset = margin_offset(pos.entry, pos.margin, pos.tokens)?;
    Ok(pos.key.side.against(pos.entry, offset))
}

/// SHORT: entry - offset, LONG: entry + offset.
pub fn break_even_price(pos: &Position) -> Result<Price> {
    let offset = margin_offset(pos.entry, pos.margin, pos.tokens)?;
    Ok(pos.key.side.toward(pos.entry, offset))
}

/// `price` reached or crossed the liquidation price (`price == liq` counts).
pub fn is_liquidated_at(pos: &Position, price: Price) -> Result<bool> {
    let offset = margin_offset(pos.entry, pos.margin, pos.tokens)?;
    Ok(pos.key.side.adverse_distance(pos.entry, price) >= offset)
}

/// Remaining margin value on a losing, not yet liquidated close:
/// margin * (offset - adverse) / offset. Full margin at entry, zero at liquidation.
pub fn margin_value(pos: &Position, price: Price) -> Result<TokenAmount> {
    let offset = margin_offset(pos.entry, pos.margin, pos.tokens)?;
    if offset.is_zero() {
        return Ok(U256::zero());
    }
    let adverse = pos.key.side.adverse_distance(pos.entry, price);
    // Moves beyond liquidation clamp to zero instead of underflowing.
    let remaining = offset.saturating_sub(adverse);
    mul_div(pos.margin, remaining, offset)
}

/// tokens * PRECISION / margin. `None` when there is no margin left.
///
/// Bound checks round toward the violation: down against the minimum, up
/// against the maximum.
pub fn leverage(
    margin: TokenAmount,
    tokens: Notional,
    rounding: Rounding,
) -> Result<Option<U256>> {
    if margin.is_zero() {
        return Ok(None);
    }
    mul_div_round(tokens, precision(), margin, rounding).map(Some)
}
