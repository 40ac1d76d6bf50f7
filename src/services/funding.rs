use primitive_types::U256;

use crate::error::{EngineError, Result};
use crate::math::rounding::mul_div;
use crate::risk::EngineCfg;
use crate::services::fees::FeesService;
use crate::state::{Position, SideBook, SideInfo};
use crate::types::{precision, Side, TokenAmount};

/// One pool-level funding transfer, computed before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingEvent {
    /// Heavier side by notional; pays.
    pub payer: Side,
    /// Total charged to the payer side (already rounded to what the per-token index can carry).
    pub funding: TokenAmount,
    /// Skimmed to the fee collector.
    pub fee: TokenAmount,
    /// Credited to the receiver side's `funds`.
    pub remainder: TokenAmount,
    /// Added to the payer's `cum_funding_paid_per_token`.
    pub paid_index_delta: U256,
    /// Added to the receiver's `cum_funding_earned_per_share`.
    pub earned_index_delta: U256,
}

/// Lazy reconciliation result for one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundingSettlement {
    /// Funding taken out of margin.
    pub charged: TokenAmount,
    /// Funding owed that margin could not cover.
    pub shortfall: TokenAmount,
    /// Funding added to the position's claim on side `funds`.
    pub earned: TokenAmount,
}

/// Funding service: responsible for
/// - computing the pool-level transfer from the heavier side to the lighter side;
/// - moving the side accumulators when that transfer runs;
/// - reconciling a position against the accumulators when it is next touched.
pub trait FundingService {
    fn compute_event<F: FeesService>(
        &self,
        sides: &SideBook,
        fees: &F,
    ) -> Result<Option<FundingEvent>>;

    fn apply_event(&self, sides: &mut SideBook, event: &FundingEvent) -> Result<()> {
        let (payer, receiver) = sides.pair_mut(event.payer);
        payer.cum_funding_paid_per_token = payer
            .cum_funding_paid_per_token
            .checked_add(event.paid_index_delta)
            .ok_or(EngineError::MathOverflow("paid_index_overflow"))?;
        receiver.cum_funding_earned_per_share = receiver
            .cum_funding_earned_per_share
            .checked_add(event.earned_index_delta)
            .ok_or(EngineError::MathOverflow("earned_index_overflow"))?;
        receiver.funds = receiver
            .funds
            .checked_add(event.remainder)
            .ok_or(EngineError::MathOverflow("funds_overflow"))?;
        Ok(())
    }

    /// Brings `pos` up to date with its side's counters. Margin is reduced by what
    /// it owes (clamped at zero) and earnings are booked into `funding_earned`.
    /// The side's margin aggregate is adjusted here too.
    fn settle_position(&self, side: &mut SideInfo, pos: &mut Position) -> Result<FundingSettlement> {
        let paid_delta = side
            .cum_funding_paid_per_token
            .saturating_sub(pos.funding_paid_index);
        let earned_delta = side
            .cum_funding_earned_per_share
            .saturating_sub(pos.funding_earned_index);
        pos.funding_paid_index = side.cum_funding_paid_per_token;
        pos.funding_earned_index = side.cum_funding_earned_per_share;

        let owed = mul_div(paid_delta, pos.tokens, precision())?;
        let earned = mul_div(earned_delta, pos.shares, precision())?;

        let charged = owed.min(pos.margin);
        let shortfall = owed - charged;
        if !charged.is_zero() {
            let old = pos.margin;
            pos.margin = old - charged;
            side.adjust_margin(old, pos.margin)?;
        }
        if !shortfall.is_zero() {
            log::warn!(
                "funding shortfall {} for {}/{}: margin clamped to zero",
                shortfall,
                pos.key.side,
                pos.key.account
            );
        }
        pos.funding_earned = pos
            .funding_earned
            .checked_add(earned)
            .ok_or(EngineError::MathOverflow("funding_earned_overflow"))?;

        Ok(FundingSettlement {
            charged,
            shortfall,
            earned,
        })
    }
}

/// funding = heavy.margin * (heavy.tokens - light.tokens) * max_daily_rate
///           / (total_tokens * events_per_day * PRECISION)
#[derive(Debug, Clone)]
pub struct BasicFundingService {
    pub max_daily_rate: U256,
    pub events_per_day: U256,
}

impl BasicFundingService {
    pub fn from_cfg(cfg: &EngineCfg) -> Self {
        Self {
            max_daily_rate: U256::from(cfg.max_daily_funding_rate),
            events_per_day: U256::from(cfg.events_per_day()),
        }
    }
}

impl Default for BasicFundingService {
    fn default() -> Self {
        Self::from_cfg(&EngineCfg::default())
    }
}

impl FundingService for BasicFundingService {
    fn compute_event<F: FeesService>(
        &self,
        sides: &SideBook,
        fees: &F,
    ) -> Result<Option<FundingEvent>> {
        let payer = if sides.short.tokens > sides.long.tokens {
            Side::Short
        } else if sides.long.tokens > sides.short.tokens {
            Side::Long
        } else {
            return Ok(None);
        };
        let heavy = sides.get(payer);
        let light = sides.get(payer.opposite());

        // Nobody to receive, or nothing to pay with.
        if light.shares.is_zero() || heavy.margin.is_zero() {
            return Ok(None);
        }

        let imbalance = heavy.tokens - light.tokens;
        let total = heavy.tokens + light.tokens;
        let weighted = mul_div(heavy.margin, imbalance, total)?;
        let raw = mul_div(
            weighted,
            self.max_daily_rate,
            self.events_per_day
                .checked_mul(precision())
                .ok_or(EngineError::MathOverflow("funding_denominator_overflow"))?,
        )?;

        // Round the charge down to what the per-token index can represent, so the
        // receiver is never credited more than the payer side will be charged.
        let paid_index_delta = mul_div(raw, precision(), heavy.tokens)?;
        if paid_index_delta.is_zero() {
            return Ok(None);
        }
        let funding = mul_div(paid_index_delta, heavy.tokens, precision())?;
        let fee = fees.funding_fee(funding)?;
        let remainder = funding - fee;
        let earned_index_delta = mul_div(remainder, precision(), light.shares)?;

        Ok(Some(FundingEvent {
            payer,
            funding,
            fee,
            remainder,
            paid_index_delta,
            earned_index_delta,
        }))
    }
}
