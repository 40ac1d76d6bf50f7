use primitive_types::U256;

use crate::error::{EngineError, Result};
use crate::math::position::leverage;
use crate::math::rounding::Rounding;
use crate::risk::EngineCfg;
use crate::types::{Notional, Price, PriceReading, Timestamp, TokenAmount};

/// tokens * PRECISION / margin must sit in [min_leverage, max_leverage].
/// Returns the leverage (rounded down) on success.
pub fn check_leverage(cfg: &EngineCfg, margin: TokenAmount, tokens: Notional) -> Result<U256> {
    let min = cfg.min_leverage_u256();
    let max = cfg.max_leverage_u256();
    let no_margin = EngineError::InvalidLeverage {
        leverage: U256::MAX,
        min,
        max,
    };
    let floor = leverage(margin, tokens, Rounding::Down)?.ok_or(no_margin.clone())?;
    let ceil = leverage(margin, tokens, Rounding::Up)?.ok_or(no_margin)?;
    if floor < min {
        return Err(EngineError::InvalidLeverage {
            leverage: floor,
            min,
            max,
        });
    }
    if ceil > max {
        return Err(EngineError::InvalidLeverage {
            leverage: ceil,
            min,
            max,
        });
    }
    Ok(floor)
}

/// Applies the staleness policy and clamps negative readings to zero.
pub fn check_price(cfg: &EngineCfg, reading: PriceReading, now: Timestamp) -> Result<Price> {
    if let Some(max_age) = cfg.max_price_age_secs {
        let age = now.saturating_sub(reading.published_at);
        if age > max_age {
            return Err(EngineError::StalePrice {
                published_at: reading.published_at,
                now,
                max_age,
            });
        }
    }
    Ok(reading.clamped())
}
