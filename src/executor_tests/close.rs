use super::helpers::*;

use crate::error::{CustodyError, EngineError};
use crate::events::EngineEvent;
use crate::services::CloseOutcome;
use crate::types::Side;

#[test]
fn close_at_entry_returns_margin_minus_leverage_fee() {
    let mut env = setup_env(100);
    let (a, b) = (env.account_a, env.account_b);

    open(&mut env.executor, T0, a, Side::Short, 10_000_000, 1);
    let rb = open(&mut env.executor, T0, b, Side::Short, 100_000, 2);
    assert_eq!(rb.leverage_fee, u(1_960));

    let out = close(&mut env.executor, T0 + 5, b, Side::Short);
    assert_eq!(out.outcome, CloseOutcome::Loss);
    assert_eq!(out.payout, u(98_040));
    assert_eq!(out.forfeited, u(0));
    assert_eq!(wallet(&env.executor, b), u(WALLET - 1_960));
    assert_conserved(&env.executor);

    // Loss branch: the fee stays behind as side profits.
    let out = close(&mut env.executor, T0 + 5, a, Side::Short);
    assert_eq!(out.payout, u(10_000_000));
    assert_eq!(wallet(&env.executor, a), u(WALLET));

    let short = env.executor.side_info(Side::Short);
    assert!(short.tokens.is_zero() && short.shares.is_zero() && short.margin.is_zero());
    assert!(short.active_shares.is_zero());
    assert_eq!(short.profits, u(1_960));
    assert_eq!(vault(&env.executor), u(1_960));
    assert_ledger_consistent(&env.executor);
    assert_conserved(&env.executor);
}

#[test]
fn symmetric_positions_at_unchanged_price_leave_empty_pools() {
    let mut env = setup_env(100);
    let (a, b) = (env.account_a, env.account_b);

    open(&mut env.executor, T0, a, Side::Short, 1_000_000, 2);
    open(&mut env.executor, T0, b, Side::Long, 1_000_000, 2);

    assert_eq!(close(&mut env.executor, T0, a, Side::Short).payout, u(1_000_000));
    assert_eq!(close(&mut env.executor, T0, b, Side::Long).payout, u(1_000_000));

    for side in Side::ALL {
        let info = env.executor.side_info(side);
        assert!(info.is_empty(), "{side} not empty: {info:?}");
        assert!(info.profits.is_zero() && info.funds.is_zero());
    }
    assert_eq!(vault(&env.executor), u(0));
    assert_eq!(wallet(&env.executor, a), u(WALLET));
    assert_eq!(wallet(&env.executor, b), u(WALLET));
}

#[test]
fn winner_collects_liquidated_margin_minus_profit_fee() {
    let mut env = setup_env(100);
    let (a, b, fc) = (env.account_a, env.account_b, env.collector);

    // both 2x: short liq at 150, long break-even at 150
    open(&mut env.executor, T0, a, Side::Short, 1_000_000, 2);
    open(&mut env.executor, T0, b, Side::Long, 1_000_000, 2);
    set_price(&mut env.executor, 150);

    let lost = close(&mut env.executor, T0 + 60, a, Side::Short);
    assert_eq!(lost.outcome, CloseOutcome::Liquidated);
    assert_eq!(lost.payout, u(0));
    assert_eq!(lost.forfeited, u(1_000_000));
    assert_eq!(env.executor.side_info(Side::Long).profits, u(1_000_000));
    assert_conserved(&env.executor);

    let preview = env
        .executor
        .preview_close(T0 + 60, b, Side::Long)
        .expect("preview must succeed");
    assert!(env.executor.position(b, Side::Long).is_some());

    let won = close(&mut env.executor, T0 + 60, b, Side::Long);
    assert_eq!(won, preview, "preview must match the executed close");
    assert_eq!(won.outcome, CloseOutcome::Profit);
    assert_eq!(won.profits_claimed, u(1_000_000));
    assert_eq!(won.fee, u(20_000));
    assert_eq!(won.payout, u(1_980_000));

    assert_eq!(wallet(&env.executor, b), u(WALLET + 980_000));
    assert_eq!(wallet(&env.executor, fc), u(20_000));
    assert_eq!(env.executor.state.fees_collected, u(20_000));
    assert_eq!(vault(&env.executor), u(0));
    assert_ledger_consistent(&env.executor);
    assert_conserved(&env.executor);
}

#[test]
fn close_emits_event_with_outcome() {
    let mut env = setup_env(100);
    let a = env.account_a;

    open(&mut env.executor, T0, a, Side::Long, 1_000_000, 4);
    set_price(&mut env.executor, 90);
    let out = close(&mut env.executor, T0 + 1, a, Side::Long);

    // 4x long: offset 25, 10 adverse => 15/25 of the margin kept
    assert_eq!(out.outcome, CloseOutcome::Loss);
    assert_eq!(out.payout, u(600_000));
    assert_eq!(out.forfeited, u(400_000));
    assert_eq!(env.executor.side_info(Side::Short).profits, u(400_000));

    let events = env.executor.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        EngineEvent::PositionClosed {
            account: a,
            margin: u(1_000_000),
            amount_out: u(600_000),
            side: Side::Long,
            outcome: CloseOutcome::Loss,
        }
    );
    assert!(env.executor.events().is_empty());
}

#[test]
fn close_requires_an_active_position() {
    let mut env = setup_env(100);
    let a = env.account_a;

    open(&mut env.executor, T0, a, Side::Long, 1_000_000, 2);
    assert_eq!(
        env.executor.close_position(T0, a, Side::Short).unwrap_err(),
        EngineError::PositionNotActive {
            account: a,
            side: Side::Short,
        }
    );
    close(&mut env.executor, T0, a, Side::Long);
    assert!(matches!(
        env.executor.close_position(T0, a, Side::Long),
        Err(EngineError::PositionNotActive { .. })
    ));
}

#[test]
fn failed_payout_rolls_the_close_back() {
    let mut env = setup_env(100);
    let (a, b) = (env.account_a, env.account_b);

    open(&mut env.executor, T0, a, Side::Short, 1_000_000, 2);
    open(&mut env.executor, T0, b, Side::Long, 1_000_000, 2);
    set_price(&mut env.executor, 150);
    close(&mut env.executor, T0 + 1, a, Side::Short);

    env.executor.custody.fail_pushes = true;
    let before = env.executor.state.clone();
    let vault_before = vault(&env.executor);
    let events_before = env.executor.events().len();

    let err = env.executor.close_position(T0 + 2, b, Side::Long).unwrap_err();
    assert!(matches!(err, EngineError::Custody(CustodyError::Rejected(_))));

    assert_eq!(env.executor.state, before, "ledger must be restored");
    assert_eq!(vault(&env.executor), vault_before);
    assert_eq!(wallet(&env.executor, b), u(WALLET - 1_000_000));
    assert_eq!(env.executor.events().len(), events_before);

    env.executor.custody.fail_pushes = false;
    let won = close(&mut env.executor, T0 + 3, b, Side::Long);
    assert_eq!(won.payout, u(1_980_000));
    assert_ledger_consistent(&env.executor);
    assert_conserved(&env.executor);
}
