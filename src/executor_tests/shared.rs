use super::helpers::*;

use std::thread;

use crate::executor::OpenRequest;
use crate::sync::SharedExecutor;
use crate::types::{AccountId, Side};

#[test]
fn concurrent_opens_keep_the_ledger_consistent() {
    let mut env = setup_env(100);
    let accounts: Vec<AccountId> = (10u8..14).map(|i| AccountId([i; 32])).collect();
    for acc in &accounts {
        env.executor.custody.inner.mint(*acc, u(WALLET));
    }
    let shared = SharedExecutor::new(env.executor);

    // Equal 1x entries: whatever the arrival order, every fee stays below margin.
    let handles: Vec<_> = accounts
        .iter()
        .map(|acc| {
            let shared = shared.clone();
            let acc = *acc;
            thread::spawn(move || {
                let req = OpenRequest {
                    account: acc,
                    side: Side::Long,
                    margin: u(1_000_000),
                    tokens: u(1_000_000),
                };
                shared.open_position(T0, req)
            })
        })
        .collect();

    for h in handles {
        h.join().expect("thread").expect("open must succeed");
    }

    shared.with(|ex| {
        assert_eq!(ex.state.positions.len(), 4);
        let long = ex.side_info(Side::Long);
        assert_eq!(long.tokens, u(4_000_000));
        // isqrt(4_000_000) regardless of order
        assert_eq!(long.shares, u(2_000));
        assert_ledger_consistent(ex);
        assert_conserved(ex);
    });
}

#[test]
fn concurrent_closes_against_one_pool() {
    let mut env = setup_env(100);
    let (a, b, c) = (env.account_a, env.account_b, env.account_c);
    open(&mut env.executor, T0, a, Side::Short, 1_000_000, 2);
    open(&mut env.executor, T0, b, Side::Long, 1_000_000, 2);
    open(&mut env.executor, T0, c, Side::Long, 1_000_000, 1);
    set_price(&mut env.executor, 120);
    let shared = SharedExecutor::new(env.executor);

    let handles: Vec<_> = [(a, Side::Short), (b, Side::Long), (c, Side::Long)]
        .into_iter()
        .map(|(acc, side)| {
            let shared = shared.clone();
            thread::spawn(move || shared.close_position(T0 + 1, acc, side))
        })
        .collect();
    for h in handles {
        h.join().expect("thread").expect("close must succeed");
    }

    shared.with(|ex| {
        assert!(ex.state.positions.is_empty());
        assert_ledger_consistent(ex);
        assert_conserved(ex);
    });
}
