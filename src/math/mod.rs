use crate::error::{EngineError, Result};
use crate::types::SignedU256;
use primitive_types::U256;
pub mod position;
pub mod rounding;
pub mod shares;

pub use rounding::{mul_div, Rounding};

pub fn apply_signed_add(base: U256, delta: SignedU256) -> Result<U256> {
    if delta.is_zero() {
        return Ok(base);
    }

    if delta.is_negative {
        base.checked_sub(delta.mag)
            .ok_or(EngineError::MathOverflow("signed_add_underflow"))
    } else {
        base.checked_add(delta.mag)
            .ok_or(EngineError::MathOverflow("signed_add_overflow"))
    }
}

/// a - b as a signed value.
pub fn signed_diff(a: U256, b: U256) -> SignedU256 {
    if a >= b {
        SignedU256::pos(a - b)
    } else {
        SignedU256::neg(b - a)
    }
}

/// Adjusts an aggregate by `new - old` without ever recomputing it.
pub fn apply_delta(aggregate: U256, old: U256, new: U256) -> Result<U256> {
    apply_signed_add(aggregate, signed_diff(new, old))
}
