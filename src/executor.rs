use log::{debug, info, warn};
use primitive_types::U256;

use crate::custody::{Custody, Transfer};
use crate::error::{EngineError, Result};
use crate::events::EngineEvent;
use crate::math::position::is_liquidated_at;
use crate::math::rounding::mul_div;
use crate::math::shares;
use crate::oracle::Oracle;
use crate::risk::{self, EngineCfg, LiquidationPreview};
use crate::services::*;
use crate::state::{FundingState, Position, PositionKey, SideBook, SideInfo, State};
use crate::types::{precision, AccountId, Notional, Price, Side, Timestamp, TokenAmount};

/// Open request, as handed over by the order-entry layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenRequest {
    pub account: AccountId,
    pub side: Side,
    /// Escrowed from `account`.
    pub margin: TokenAmount,
    /// Notional size.
    pub tokens: Notional,
}

impl OpenRequest {
    /// tokens = margin * leverage / PRECISION.
    pub fn with_leverage(
        account: AccountId,
        side: Side,
        margin: TokenAmount,
        leverage: U256,
    ) -> Result<Self> {
        Ok(Self {
            account,
            side,
            margin,
            tokens: mul_div(margin, leverage, precision())?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenReceipt {
    pub key: PositionKey,
    pub shares: U256,
    pub active_shares: U256,
    pub leverage_fee: TokenAmount,
    /// Margin after the leverage fee.
    pub margin: TokenAmount,
    pub entry: Price,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingReceipt {
    /// `None` when nothing moved (balanced pools, empty receiver, no payer margin).
    pub event: Option<FundingEvent>,
    pub next_funding_time: Timestamp,
}

/// Working copies of what a single-position operation may change. Nothing is
/// visible in `State` until `commit`.
struct Touched {
    pos: Position,
    own: SideInfo,
    bad_debt: TokenAmount,
}

/// Ledger snapshot restored when an outbound transfer fails after commit.
struct Checkpoint {
    position: Option<Position>,
    sides: SideBook,
    funding: FundingState,
    fees_collected: TokenAmount,
    bad_debt: TokenAmount,
}

impl Checkpoint {
    fn capture(state: &State, key: Option<&PositionKey>) -> Self {
        Self {
            position: key.and_then(|k| state.positions.get(k).cloned()),
            sides: state.sides.clone(),
            funding: state.funding.clone(),
            fees_collected: state.fees_collected,
            bad_debt: state.bad_debt,
        }
    }

    fn restore(self, state: &mut State) {
        if let Some(p) = self.position {
            state.positions.upsert(p);
        }
        state.sides = self.sides;
        state.funding = self.funding;
        state.fees_collected = self.fees_collected;
        state.bad_debt = self.bad_debt;
    }
}

/// The position engine. Every public operation is one atomic transition:
/// validate, escrow, commit the ledger, then pay out.
pub struct Executor<S: ServicesBundle, O: Oracle, C: Custody> {
    pub state: State,
    pub services: S,
    pub oracle: O,
    pub custody: C,
    pub cfg: EngineCfg,
    events: Vec<EngineEvent>,
}

impl<O: Oracle, C: Custody> Executor<BasicServicesBundle, O, C> {
    pub fn with_basic_services(cfg: EngineCfg, oracle: O, custody: C, now: Timestamp) -> Result<Self> {
        let services = BasicServicesBundle::from_cfg(&cfg);
        Self::new(cfg, services, oracle, custody, now)
    }
}

impl<S: ServicesBundle, O: Oracle, C: Custody> Executor<S, O, C> {
    pub fn new(cfg: EngineCfg, services: S, oracle: O, custody: C, now: Timestamp) -> Result<Self> {
        cfg.validate()?;
        let state = State::new(FundingState::starting_at(now, cfg.funding_interval_secs));
        Ok(Self {
            state,
            services,
            oracle,
            custody,
            cfg,
            events: Vec::new(),
        })
    }

    pub fn current_price(&self, now: Timestamp) -> Result<Price> {
        let reading = self.oracle.latest_price()?;
        risk::validation::check_price(&self.cfg, reading, now)
    }

    pub fn open_position(&mut self, now: Timestamp, req: OpenRequest) -> Result<OpenReceipt> {
        let key = PositionKey {
            account: req.account,
            side: req.side,
        };
        if self.state.positions.contains(&key) {
            return Err(EngineError::PositionAlreadyActive {
                account: req.account,
                side: req.side,
            });
        }
        if req.margin.is_zero() {
            return Err(EngineError::InvalidAmount("margin"));
        }
        if req.tokens.is_zero() {
            return Err(EngineError::InvalidAmount("tokens"));
        }

        let price = self.current_price(now)?;
        if price.is_zero() {
            return Err(EngineError::InvalidPrice);
        }
        let leverage = risk::validation::check_leverage(&self.cfg, req.margin, req.tokens)?;

        let mut own = self.state.sides.get(req.side).clone();
        let share_delta = shares::share_delta(own.tokens, req.tokens)?;
        let leverage_fee = self
            .services
            .fees()
            .leverage_fee(req.tokens, share_delta, own.shares)?;
        if leverage_fee >= req.margin {
            return Err(EngineError::LeverageFeeExceedsMargin {
                fee: leverage_fee,
                margin: req.margin,
            });
        }

        let mut pos = Position::new(
            key,
            req.margin - leverage_fee,
            req.tokens,
            share_delta,
            price,
            now,
        );
        pos.entered_at_min_leverage = leverage == self.cfg.min_leverage_u256();
        pos.funding_paid_index = own.cum_funding_paid_per_token;
        pos.funding_earned_index = own.cum_funding_earned_per_share;
        pos.active_shares = self.services.valuation().active_shares(&pos, price)?;

        own.add_position(&pos)?;
        // Existing holders are the ones diluted.
        own.credit_profits(leverage_fee)?;

        self.custody.pull(req.account, req.margin)?;

        let receipt = OpenReceipt {
            key,
            shares: pos.shares,
            active_shares: pos.active_shares,
            leverage_fee,
            margin: pos.margin,
            entry: price,
        };
        self.state.positions.upsert(pos);
        *self.state.sides.get_mut(req.side) = own;

        info!(
            "opened {} {}: margin {} tokens {} shares {} fee {} entry {}",
            req.side, req.account, receipt.margin, req.tokens, receipt.shares, leverage_fee, price
        );
        self.events.push(EngineEvent::PositionOpened {
            account: req.account,
            margin: req.margin,
            leverage,
            side: req.side,
        });
        Ok(receipt)
    }

    pub fn add_margin(
        &mut self,
        now: Timestamp,
        account: AccountId,
        side: Side,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount("amount"));
        }
        let key = PositionKey { account, side };
        let price = self.current_price(now)?;
        let mut t = self.touch(&key, price, now)?;

        let old = t.pos.margin;
        let new = old
            .checked_add(amount)
            .ok_or(EngineError::MathOverflow("margin_overflow"))?;
        risk::validation::check_leverage(&self.cfg, new, t.pos.tokens)?;
        t.pos.margin = new;
        t.own.adjust_margin(old, new)?;
        self.services
            .valuation()
            .refresh_active_shares(&mut t.own, &mut t.pos, price)?;

        self.custody.pull(account, amount)?;
        self.commit(t);

        info!("margin added {} {}: +{} -> {}", side, account, amount, new);
        self.events.push(EngineEvent::MarginAdded {
            account,
            amount,
            side,
        });
        Ok(())
    }

    /// Owner close. Routes to profit, loss or liquidation by price.
    pub fn close_position(
        &mut self,
        now: Timestamp,
        account: AccountId,
        side: Side,
    ) -> Result<CloseSettlement> {
        self.close_core(now, PositionKey { account, side }, false)
    }

    /// Anyone may call; fails unless the price has reached the liquidation price.
    pub fn liquidate(
        &mut self,
        now: Timestamp,
        account: AccountId,
        side: Side,
    ) -> Result<CloseSettlement> {
        self.close_core(now, PositionKey { account, side }, true)
    }

    fn close_core(
        &mut self,
        now: Timestamp,
        key: PositionKey,
        require_liquidatable: bool,
    ) -> Result<CloseSettlement> {
        let price = self.current_price(now)?;
        let mut t = self.touch(&key, price, now)?;

        if require_liquidatable && !is_liquidated_at(&t.pos, price)? {
            return Err(EngineError::PositionNotLiquidatable {
                account: key.account,
                side: key.side,
            });
        }

        let settlement = settle_close(&t.pos, &t.own, price, self.services.fees())?;

        t.own.profits = t
            .own
            .profits
            .checked_sub(settlement.profits_claimed)
            .ok_or(EngineError::MathOverflow("side_profits_underflow"))?;
        t.own.funds = t
            .own
            .funds
            .checked_sub(settlement.funds_claimed)
            .ok_or(EngineError::MathOverflow("side_funds_underflow"))?;
        t.own.remove_position(&t.pos)?;
        let mut opposite = self.state.sides.get(key.side.opposite()).clone();
        opposite.credit_profits(settlement.forfeited)?;
        let fees_collected = self
            .state
            .fees_collected
            .checked_add(settlement.fee)
            .ok_or(EngineError::MathOverflow("fees_collected_overflow"))?;

        // Ledger first; the position is gone before anything is paid to it.
        let checkpoint = Checkpoint::capture(&self.state, Some(&key));
        self.state.positions.remove(&key);
        *self.state.sides.get_mut(key.side) = t.own;
        *self.state.sides.get_mut(key.side.opposite()) = opposite;
        self.state.bad_debt = t.bad_debt;
        self.state.fees_collected = fees_collected;

        let transfers = [
            Transfer {
                to: key.account,
                amount: settlement.payout,
            },
            Transfer {
                to: self.cfg.fee_collector,
                amount: settlement.fee,
            },
        ];
        if let Err(e) = self.custody.push_all(&transfers) {
            warn!("close of {} {} rolled back: {}", key.side, key.account, e);
            checkpoint.restore(&mut self.state);
            return Err(e.into());
        }

        info!(
            "closed {} {} ({:?}) at {}: margin {} out {} fee {} forfeited {}",
            key.side,
            key.account,
            settlement.outcome,
            price,
            settlement.margin,
            settlement.payout,
            settlement.fee,
            settlement.forfeited
        );
        self.events.push(EngineEvent::PositionClosed {
            account: key.account,
            margin: settlement.margin,
            amount_out: settlement.payout,
            side: key.side,
            outcome: settlement.outcome,
        });
        Ok(settlement)
    }

    /// Pool-level funding event. O(1) in the number of positions; each position
    /// catches up lazily on its next touch.
    pub fn trigger_funding(&mut self, now: Timestamp) -> Result<FundingReceipt> {
        let due = self.state.funding.funding_due;
        if !self.state.funding.is_due(now) {
            return Err(EngineError::FundingRateNotDue { due, now });
        }

        let event = self
            .services
            .funding()
            .compute_event(&self.state.sides, self.services.fees())?;
        let next_funding_time = due.saturating_add(self.cfg.funding_interval_secs);

        let checkpoint = Checkpoint::capture(&self.state, None);
        let result = (|| -> Result<()> {
            if let Some(ev) = &event {
                self.services.funding().apply_event(&mut self.state.sides, ev)?;
                self.state.fees_collected = self
                    .state
                    .fees_collected
                    .checked_add(ev.fee)
                    .ok_or(EngineError::MathOverflow("fees_collected_overflow"))?;
            }
            let funding = &mut self.state.funding;
            funding.funding_due = next_funding_time;
            funding.last_funded_at = now;
            funding.events += 1;

            if let Some(ev) = &event {
                self.custody
                    .push_all(&[Transfer {
                        to: self.cfg.fee_collector,
                        amount: ev.fee,
                    }])
                    .map_err(EngineError::from)?;
            }
            Ok(())
        })();
        if let Err(e) = result {
            warn!("funding event rolled back: {}", e);
            checkpoint.restore(&mut self.state);
            return Err(e);
        }

        match &event {
            Some(ev) => {
                info!(
                    "funding: {} pays {} (fee {}), next at {}",
                    ev.payer, ev.funding, ev.fee, next_funding_time
                );
                self.events.push(EngineEvent::FundingPaid {
                    funding_fee: ev.fee,
                    next_funding_time,
                    side: ev.payer,
                });
            }
            None => debug!("funding: nothing to transfer, next at {}", next_funding_time),
        }

        Ok(FundingReceipt {
            event,
            next_funding_time,
        })
    }

    pub fn position(&self, account: AccountId, side: Side) -> Option<&Position> {
        self.state.positions.get(&PositionKey { account, side })
    }

    pub fn side_info(&self, side: Side) -> &SideInfo {
        self.state.sides.get(side)
    }

    /// Thresholds at the current price, with pending funding applied.
    pub fn liquidation_preview(
        &self,
        now: Timestamp,
        account: AccountId,
        side: Side,
    ) -> Result<LiquidationPreview> {
        let price = self.current_price(now)?;
        let t = self.touch(&PositionKey { account, side }, price, now)?;
        risk::liquidation::preview(&t.pos, price)
    }

    pub fn is_liquidatable(&self, now: Timestamp, account: AccountId, side: Side) -> Result<bool> {
        Ok(self.liquidation_preview(now, account, side)?.is_liquidatable)
    }

    pub fn liquidation_price(&self, now: Timestamp, account: AccountId, side: Side) -> Result<Price> {
        Ok(self.liquidation_preview(now, account, side)?.liquidation_price)
    }

    pub fn break_even_price(&self, now: Timestamp, account: AccountId, side: Side) -> Result<Price> {
        Ok(self.liquidation_preview(now, account, side)?.break_even_price)
    }

    /// What `close_position` would do right now, without doing it.
    pub fn preview_close(
        &self,
        now: Timestamp,
        account: AccountId,
        side: Side,
    ) -> Result<CloseSettlement> {
        let price = self.current_price(now)?;
        let t = self.touch(&PositionKey { account, side }, price, now)?;
        settle_close(&t.pos, &t.own, price, self.services.fees())
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Copies the position and its side row, reconciles funding and refreshes
    /// active shares on the copies.
    fn touch(&self, key: &PositionKey, price: Price, now: Timestamp) -> Result<Touched> {
        let mut pos = self
            .state
            .positions
            .get(key)
            .cloned()
            .ok_or(EngineError::PositionNotActive {
                account: key.account,
                side: key.side,
            })?;
        let mut own = self.state.sides.get(key.side).clone();

        let settled = self.services.funding().settle_position(&mut own, &mut pos)?;
        let bad_debt = self
            .state
            .bad_debt
            .checked_add(settled.shortfall)
            .ok_or(EngineError::MathOverflow("bad_debt_overflow"))?;
        self.services
            .valuation()
            .refresh_active_shares(&mut own, &mut pos, price)?;
        pos.last_updated_at = now;

        Ok(Touched { pos, own, bad_debt })
    }

    fn commit(&mut self, t: Touched) {
        *self.state.sides.get_mut(t.pos.key.side) = t.own;
        self.state.bad_debt = t.bad_debt;
        self.state.positions.upsert(t.pos);
    }
}
