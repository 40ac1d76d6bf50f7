use std::sync::Arc;

use parking_lot::Mutex;

use crate::custody::Custody;
use crate::error::Result;
use crate::executor::{Executor, FundingReceipt, OpenReceipt, OpenRequest};
use crate::oracle::Oracle;
use crate::services::{CloseSettlement, ServicesBundle};
use crate::types::{AccountId, Side, Timestamp, TokenAmount};

/// Executor shared across threads. Each operation runs under one lock, which
/// covers both side rows; close mutates the opposite side as well.
pub struct SharedExecutor<S: ServicesBundle, O: Oracle, C: Custody> {
    inner: Arc<Mutex<Executor<S, O, C>>>,
}

impl<S: ServicesBundle, O: Oracle, C: Custody> Clone for SharedExecutor<S, O, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ServicesBundle, O: Oracle, C: Custody> SharedExecutor<S, O, C> {
    pub fn new(executor: Executor<S, O, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(executor)),
        }
    }

    /// Runs `f` as one critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut Executor<S, O, C>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn open_position(&self, now: Timestamp, req: OpenRequest) -> Result<OpenReceipt> {
        self.with(|ex| ex.open_position(now, req))
    }

    pub fn add_margin(
        &self,
        now: Timestamp,
        account: AccountId,
        side: Side,
        amount: TokenAmount,
    ) -> Result<()> {
        self.with(|ex| ex.add_margin(now, account, side, amount))
    }

    pub fn close_position(
        &self,
        now: Timestamp,
        account: AccountId,
        side: Side,
    ) -> Result<CloseSettlement> {
        self.with(|ex| ex.close_position(now, account, side))
    }

    pub fn liquidate(&self, now: Timestamp, account: AccountId, side: Side) -> Result<CloseSettlement> {
        self.with(|ex| ex.liquidate(now, account, side))
    }

    pub fn trigger_funding(&self, now: Timestamp) -> Result<FundingReceipt> {
        self.with(|ex| ex.trigger_funding(now))
    }
}
