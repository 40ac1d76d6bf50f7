use primitive_types::U256;

use crate::error::Result;
use crate::math::rounding::apply_bps;
use crate::math::shares;
use crate::risk::EngineCfg;
use crate::types::{Notional, TokenAmount};

/// Fee schedule of the engine.
///
/// - leverage fee: paid by a new entrant for diluting an existing pool; stays in
///   the side's `profits`.
/// - profit fee: skimmed from share profits and funding on a profitable close.
/// - funding fee: skimmed from every funding transfer.
pub trait FeesService {
    fn leverage_fee(
        &self,
        tokens: Notional,
        share_delta: U256,
        side_shares: U256,
    ) -> Result<TokenAmount>;

    fn profit_fee(&self, gross: TokenAmount) -> Result<TokenAmount>;

    fn funding_fee(&self, funding: TokenAmount) -> Result<TokenAmount>;
}

#[derive(Debug, Clone)]
pub struct BasicFeesService {
    pub profit_fee_bps: u32,
    pub funding_fee_bps: u32,
}

impl BasicFeesService {
    pub fn new(profit_fee_bps: u32, funding_fee_bps: u32) -> Self {
        Self {
            profit_fee_bps,
            funding_fee_bps,
        }
    }

    pub fn from_cfg(cfg: &EngineCfg) -> Self {
        Self::new(cfg.profit_fee_bps, cfg.funding_fee_bps)
    }
}

impl Default for BasicFeesService {
    fn default() -> Self {
        Self::from_cfg(&EngineCfg::default())
    }
}

impl FeesService for BasicFeesService {
    fn leverage_fee(
        &self,
        tokens: Notional,
        share_delta: U256,
        side_shares: U256,
    ) -> Result<TokenAmount> {
        shares::leverage_fee(tokens, share_delta, side_shares)
    }

    fn profit_fee(&self, gross: TokenAmount) -> Result<TokenAmount> {
        apply_bps(gross, self.profit_fee_bps)
    }

    fn funding_fee(&self, funding: TokenAmount) -> Result<TokenAmount> {
        apply_bps(funding, self.funding_fee_bps)
    }
}
