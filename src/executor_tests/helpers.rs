use crate::{
    custody::{Custody, InMemoryCustody, Transfer},
    error::{CustodyError, Result},
    executor::{Executor, OpenReceipt, OpenRequest},
    oracle::Oracle,
    risk::EngineCfg,
    services::{BasicServicesBundle, CloseSettlement},
    state::Position,
    types::{AccountId, PriceReading, Side, Timestamp, PRECISION},
};
use primitive_types::U256;

pub type TestExecutor = Executor<BasicServicesBundle, TestOracle, TestCustody>;

/// Engine start time; the first funding event is due one interval later.
pub const T0: Timestamp = 1_000;

/// Every test wallet starts with this many settlement tokens.
pub const WALLET: u64 = 1_000_000_000_000;

#[allow(dead_code)]
pub fn u(x: u64) -> U256 {
    U256::from(x)
}

#[allow(dead_code)]
pub fn leverage_x(x: u64) -> U256 {
    U256::from(x) * U256::from(PRECISION)
}

/// Common test environment bundle: executor + funded accounts.
pub struct TestEnv {
    pub executor: TestExecutor,

    pub account_a: AccountId,
    pub account_b: AccountId,
    pub account_c: AccountId,

    /// Never funded; used to check custody failures on open.
    pub pauper: AccountId,

    pub collector: AccountId,
}

#[allow(dead_code)]
pub fn setup_env(price: i128) -> TestEnv {
    setup_env_with(EngineCfg::default(), price)
}

/// Executor with the basic services, an oracle quoting `price` as of `T0`, and
/// three wallets holding `WALLET` each.
#[allow(dead_code)]
pub fn setup_env_with(cfg: EngineCfg, price: i128) -> TestEnv {
    let account_a = AccountId([1; 32]);
    let account_b = AccountId([2; 32]);
    let account_c = AccountId([3; 32]);
    let pauper = AccountId([9; 32]);
    let collector = cfg.fee_collector;

    let mut custody = TestCustody::default();
    for acc in [account_a, account_b, account_c] {
        custody.inner.mint(acc, u(WALLET));
    }

    let oracle = TestOracle {
        reading: PriceReading {
            price,
            published_at: T0,
        },
    };

    let executor = Executor::with_basic_services(cfg, oracle, custody, T0)
        .expect("default config must validate");

    TestEnv {
        executor,
        account_a,
        account_b,
        account_c,
        pauper,
        collector,
    }
}

/// A simple oracle with a mutable `reading` field.
/// In tests you will do: `set_price(&mut env.executor, 150)`.
#[derive(Clone, Copy, Debug)]
pub struct TestOracle {
    pub reading: PriceReading,
}

impl Oracle for TestOracle {
    fn latest_price(&self) -> Result<PriceReading> {
        Ok(self.reading)
    }
}

/// In-memory custody whose outbound transfers can be switched off.
#[derive(Clone, Debug, Default)]
pub struct TestCustody {
    pub inner: InMemoryCustody,
    pub fail_pushes: bool,
}

impl Custody for TestCustody {
    fn pull(&mut self, from: AccountId, amount: U256) -> std::result::Result<(), CustodyError> {
        self.inner.pull(from, amount)
    }

    fn push(&mut self, to: AccountId, amount: U256) -> std::result::Result<(), CustodyError> {
        self.push_all(&[Transfer { to, amount }])
    }

    fn push_all(&mut self, transfers: &[Transfer]) -> std::result::Result<(), CustodyError> {
        if self.fail_pushes {
            return Err(CustodyError::Rejected("pushes disabled".into()));
        }
        self.inner.push_all(transfers)
    }
}

/// Keeps the publish time, so staleness checks are unaffected.
#[allow(dead_code)]
pub fn set_price(executor: &mut TestExecutor, price: i128) {
    executor.oracle.reading.price = price;
}

#[allow(dead_code)]
pub fn set_reading(executor: &mut TestExecutor, price: i128, published_at: Timestamp) {
    executor.oracle.reading = PriceReading {
        price,
        published_at,
    };
}

/// Open with `margin * leverage_x` tokens. Panics if the engine refuses.
#[allow(dead_code)]
pub fn open(
    executor: &mut TestExecutor,
    now: Timestamp,
    account: AccountId,
    side: Side,
    margin: u64,
    lev_x: u64,
) -> OpenReceipt {
    let req = OpenRequest::with_leverage(account, side, u(margin), leverage_x(lev_x))
        .expect("request must build");
    executor
        .open_position(now, req)
        .expect("open_position must succeed")
}

/// Raw open with an explicit notional; the caller inspects the result.
#[allow(dead_code)]
pub fn try_open(
    executor: &mut TestExecutor,
    now: Timestamp,
    account: AccountId,
    side: Side,
    margin: u64,
    tokens: u64,
) -> Result<OpenReceipt> {
    executor.open_position(
        now,
        OpenRequest {
            account,
            side,
            margin: u(margin),
            tokens: u(tokens),
        },
    )
}

#[allow(dead_code)]
pub fn close(
    executor: &mut TestExecutor,
    now: Timestamp,
    account: AccountId,
    side: Side,
) -> CloseSettlement {
    let out = executor
        .close_position(now, account, side)
        .expect("close_position must succeed");
    assert_position_removed(executor, account, side);
    out
}

#[allow(dead_code)]
pub fn wallet(executor: &TestExecutor, account: AccountId) -> U256 {
    executor.custody.inner.balance_of(account)
}

#[allow(dead_code)]
pub fn vault(executor: &TestExecutor) -> U256 {
    executor.custody.inner.vault_balance()
}

/// Convenience: fetch and clone a position (panic if missing).
#[allow(dead_code)]
pub fn get_position(executor: &TestExecutor, account: AccountId, side: Side) -> Position {
    executor
        .position(account, side)
        .expect("position must exist")
        .clone()
}

#[allow(dead_code)]
pub fn assert_position_removed(executor: &TestExecutor, account: AccountId, side: Side) {
    assert!(
        executor.position(account, side).is_none(),
        "expected position to be removed; account={account} side={side}"
    );
}

/// Side aggregates equal the per-position sums and no entitlement exceeds its shares.
#[allow(dead_code)]
pub fn assert_ledger_consistent(executor: &TestExecutor) {
    let mismatches = executor.state.ledger_mismatches();
    assert!(mismatches.is_empty(), "ledger drift: {mismatches:?}");
    for side in Side::ALL {
        let info = executor.side_info(side);
        assert!(
            info.active_shares <= info.shares,
            "{side}: active {} > shares {}",
            info.active_shares,
            info.shares
        );
    }
}

/// Without funding every token in the vault is owed to someone on the ledger.
#[allow(dead_code)]
pub fn assert_conserved(executor: &TestExecutor) {
    assert_eq!(
        vault(executor),
        executor.state.total_liabilities(),
        "vault must equal margins + funds + profits"
    );
}
