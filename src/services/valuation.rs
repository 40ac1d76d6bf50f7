use primitive_types::U256;

use crate::error::Result;
use crate::math::position::margin_offset;
use crate::math::rounding::mul_div;
use crate::risk::EngineCfg;
use crate::state::{Position, SideInfo};
use crate::types::{precision, Price};

/// Active-share valuation: how much of a position's `shares` currently earns a
/// cut of its side's `profits`.
pub trait ValuationService {
    fn active_shares(&self, pos: &Position, price: Price) -> Result<U256>;

    /// Recomputes the position's entitlement and moves the side aggregate by the delta.
    fn refresh_active_shares(
        &self,
        side: &mut SideInfo,
        pos: &mut Position,
        price: Price,
    ) -> Result<()> {
        let old = pos.active_shares;
        let new = self.active_shares(pos, price)?;
        if new != old {
            side.adjust_active_shares(old, new)?;
            pos.active_shares = new;
            log::debug!(
                "active shares {} -> {} for {}/{} at price {}",
                old,
                new,
                pos.key.side,
                pos.key.account,
                price
            );
        }
        Ok(())
    }
}

/// Linear interpolation between entry (nothing) and the break-even price
/// `entry -/+ entry * margin / tokens` (everything).
///
/// A position at minimum leverage, either now or when it was opened (before the
/// leverage fee came off its margin), is fully entitled regardless of price.
#[derive(Debug, Clone)]
pub struct BasicValuationService {
    pub min_leverage: U256,
}

impl BasicValuationService {
    pub fn from_cfg(cfg: &EngineCfg) -> Self {
        Self {
            min_leverage: cfg.min_leverage_u256(),
        }
    }

    fn at_min_leverage(&self, pos: &Position) -> Result<bool> {
        if pos.margin.is_zero() {
            return Ok(false);
        }
        if pos.entered_at_min_leverage {
            return Ok(true);
        }
        // tokens * PRECISION <= margin * min_leverage
        let lhs = mul_div(pos.tokens, precision(), U256::one())?;
        let rhs = mul_div(pos.margin, self.min_leverage, U256::one())?;
        Ok(lhs <= rhs)
    }
}

impl Default for BasicValuationService {
    fn default() -> Self {
        Self::from_cfg(&EngineCfg::default())
    }
}

impl ValuationService for BasicValuationService {
    fn active_shares(&self, pos: &Position, price: Price) -> Result<U256> {
        if pos.shares.is_zero() {
            return Ok(U256::zero());
        }
        if self.at_min_leverage(pos)? {
            return Ok(pos.shares);
        }
        let offset = margin_offset(pos.entry, pos.margin, pos.tokens)?;
        if offset.is_zero() {
            return Ok(U256::zero());
        }
        let favorable = pos.key.side.favorable_distance(pos.entry, price);
        if favorable >= offset {
            return Ok(pos.shares);
        }
        mul_div(pos.shares, favorable, offset)
    }
}
