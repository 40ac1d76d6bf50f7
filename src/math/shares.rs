use primitive_types::U256;

use crate::error::{EngineError, Result};
use crate::math::rounding::mul_div;
use crate::types::{Notional, TokenAmount};

/// Square-root bonding curve: sqrt(side_tokens + tokens) - sqrt(side_tokens).
///
/// Sub-linear in `tokens`, so a large entrant gets fewer shares per token than the
/// pool already holds.
pub fn share_delta(side_tokens: Notional, tokens: Notional) -> Result<U256> {
    let after = side_tokens
        .checked_add(tokens)
        .ok_or(EngineError::MathOverflow("side_tokens_overflow"))?;
    Ok(after.integer_sqrt() - side_tokens.integer_sqrt())
}

/// Fee charged for diluting an existing pool: tokens * share_delta / side_shares.
/// Zero on an empty side.
pub fn leverage_fee(tokens: Notional, share_delta: U256, side_shares: U256) -> Result<TokenAmount> {
    if side_shares.is_zero() {
        return Ok(U256::zero());
    }
    mul_div(tokens, share_delta, side_shares)
}

/// amount * part / whole. Zero when `part` is zero; panics when a non-zero part
/// meets a zero whole, since the aggregate must contain its parts.
pub fn pro_rata(amount: TokenAmount, part: U256, whole: U256) -> Result<TokenAmount> {
    if part.is_zero() || amount.is_zero() {
        return Ok(U256::zero());
    }
    assert!(
        !whole.is_zero(),
        "ledger invariant broken: non-zero part {part} of an empty aggregate"
    );
    mul_div(amount, part, whole)
}
