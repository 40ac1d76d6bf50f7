use primitive_types::U256;

use crate::error::{EngineError, Result};
use crate::math;
use crate::state::Position;
use crate::types::{Notional, Side, TokenAmount};

/// Aggregate ledger row for one side.
///
/// `tokens`, `shares`, `active_shares` and `margin` are exact sums over the side's
/// positions. They are only ever moved by deltas; the number of positions is
/// unbounded, so nothing here scans.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SideInfo {
    pub tokens: Notional,
    pub shares: U256,
    pub active_shares: U256,
    pub margin: TokenAmount,

    /// Funding received from the opposite side, owed out by `shares`.
    pub funds: TokenAmount,
    /// Fees, losses and liquidations, owed out by `active_shares`.
    pub profits: TokenAmount,

    /// Cumulative funding per share earned by this side (PRECISION scaled).
    pub cum_funding_earned_per_share: U256,
    /// Cumulative funding per token paid by this side (PRECISION scaled).
    pub cum_funding_paid_per_token: U256,
}

impl SideInfo {
    pub fn add_position(&mut self, pos: &Position) -> Result<()> {
        self.tokens = checked_add(self.tokens, pos.tokens, "side_tokens_overflow")?;
        self.shares = checked_add(self.shares, pos.shares, "side_shares_overflow")?;
        self.active_shares =
            checked_add(self.active_shares, pos.active_shares, "side_active_overflow")?;
        self.margin = checked_add(self.margin, pos.margin, "side_margin_overflow")?;
        Ok(())
    }

    pub fn remove_position(&mut self, pos: &Position) -> Result<()> {
        self.tokens = checked_sub(self.tokens, pos.tokens, "side_tokens_underflow")?;
        self.shares = checked_sub(self.shares, pos.shares, "side_shares_underflow")?;
        self.active_shares =
            checked_sub(self.active_shares, pos.active_shares, "side_active_underflow")?;
        self.margin = checked_sub(self.margin, pos.margin, "side_margin_underflow")?;
        Ok(())
    }

    pub fn adjust_active_shares(&mut self, old: U256, new: U256) -> Result<()> {
        self.active_shares = math::apply_delta(self.active_shares, old, new)?;
        Ok(())
    }

    pub fn adjust_margin(&mut self, old: TokenAmount, new: TokenAmount) -> Result<()> {
        self.margin = math::apply_delta(self.margin, old, new)?;
        Ok(())
    }

    pub fn credit_profits(&mut self, amount: TokenAmount) -> Result<()> {
        self.profits = checked_add(self.profits, amount, "side_profits_overflow")?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_zero() && self.shares.is_zero()
    }
}

fn checked_add(a: U256, b: U256, what: &'static str) -> Result<U256> {
    a.checked_add(b).ok_or(EngineError::MathOverflow(what))
}

fn checked_sub(a: U256, b: U256, what: &'static str) -> Result<U256> {
    a.checked_sub(b).ok_or(EngineError::MathOverflow(what))
}

/// The two ledger rows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SideBook {
    pub short: SideInfo,
    pub long: SideInfo,
}

impl SideBook {
    pub fn get(&self, side: Side) -> &SideInfo {
        match side {
            Side::Short => &self.short,
            Side::Long => &self.long,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut SideInfo {
        match side {
            Side::Short => &mut self.short,
            Side::Long => &mut self.long,
        }
    }

    /// (own, opposite), both mutable; close touches both rows.
    pub fn pair_mut(&mut self, side: Side) -> (&mut SideInfo, &mut SideInfo) {
        match side {
            Side::Short => (&mut self.short, &mut self.long),
            Side::Long => (&mut self.long, &mut self.short),
        }
    }
}
