use primitive_types::{U256, U512};

use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug)]
pub enum Rounding {
    Down, // floor
    Up,   // ceil
}

/// floor(a * b / den) with a 512-bit intermediate product.
pub fn mul_div(a: U256, b: U256, den: U256) -> Result<U256> {
    mul_div_round(a, b, den, Rounding::Down)
}

pub fn mul_div_round(a: U256, b: U256, den: U256, rounding: Rounding) -> Result<U256> {
    if den.is_zero() {
        return Err(EngineError::MathOverflow("mul_div_den_zero"));
    }
    let prod = U512::from(a) * U512::from(b);
    let den = U512::from(den);
    let mut q = prod / den;
    if matches!(rounding, Rounding::Up) && !(prod % den).is_zero() {
        q += U512::one();
    }
    u512_to_u256_checked(q)
}

fn u512_to_u256_checked(x: U512) -> Result<U256> {
    let be = x.to_big_endian();

    if be[..32].iter().any(|&b| b != 0) {
        return Err(EngineError::MathOverflow("mul_div_overflow"));
    }

    Ok(U256::from_big_endian(&be[32..]))
}

/// value * bps / 10_000, floored.
pub fn apply_bps(value: U256, bps: u32) -> Result<U256> {
    mul_div(value, U256::from(bps), U256::from(crate::types::BPS_DENOM))
}
