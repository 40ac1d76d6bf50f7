// src/state/mod.rs

mod funding_state;
mod position_store;
mod side_info;

pub use funding_state::*;
pub use position_store::*;
pub use side_info::*;

use primitive_types::U256;

use crate::types::*;

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub positions: PositionStore,
    pub sides: SideBook,
    pub funding: FundingState,
    /// Total pushed to the fee collector (profit fees and funding fees).
    pub fees_collected: TokenAmount,
    /// Funding owed by positions whose margin could not cover it.
    pub bad_debt: TokenAmount,
}

impl State {
    pub fn new(funding: FundingState) -> Self {
        Self {
            funding,
            ..Self::default()
        }
    }

    /// Recomputes every side aggregate by scanning positions and reports each
    /// mismatch. Audit/test helper; operations never call it.
    pub fn ledger_mismatches(&self) -> Vec<String> {
        let mut out = Vec::new();
        for side in Side::ALL {
            let mut tokens = U256::zero();
            let mut shares = U256::zero();
            let mut active = U256::zero();
            let mut margin = U256::zero();
            for (_, p) in self.positions.iter().filter(|(k, _)| k.side == side) {
                tokens += p.tokens;
                shares += p.shares;
                active += p.active_shares;
                margin += p.margin;
                if p.active_shares > p.shares {
                    out.push(format!(
                        "{side}/{}: active_shares {} > shares {}",
                        p.key.account, p.active_shares, p.shares
                    ));
                }
            }
            let info = self.sides.get(side);
            for (name, agg, sum) in [
                ("tokens", info.tokens, tokens),
                ("shares", info.shares, shares),
                ("active_shares", info.active_shares, active),
                ("margin", info.margin, margin),
            ] {
                if agg != sum {
                    out.push(format!("{side}: {name} aggregate {agg} != sum {sum}"));
                }
            }
        }
        out
    }

    /// Settlement tokens the ledger owes out: margins, unclaimed funds and profits.
    pub fn total_liabilities(&self) -> TokenAmount {
        Side::ALL.iter().fold(U256::zero(), |acc, s| {
            let info = self.sides.get(*s);
            acc + info.margin + info.funds + info.profits
        })
    }
}
