use std::collections::HashMap;

use primitive_types::U256;

use crate::error::CustodyError;
use crate::types::{AccountId, TokenAmount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub to: AccountId,
    pub amount: TokenAmount,
}

/// Settlement-token custody. Every call either fully succeeds or moves nothing.
pub trait Custody {
    /// Escrow `amount` from `from` into the engine.
    fn pull(&mut self, from: AccountId, amount: TokenAmount) -> Result<(), CustodyError>;

    /// Pay `amount` out of the engine to `to`.
    fn push(&mut self, to: AccountId, amount: TokenAmount) -> Result<(), CustodyError>;

    /// Pays a batch out, all or nothing. The default only holds that promise if
    /// `push` cannot fail after an earlier push in the batch succeeded; custodians
    /// that can fail midway should override it.
    fn push_all(&mut self, transfers: &[Transfer]) -> Result<(), CustodyError> {
        for t in transfers.iter().filter(|t| !t.amount.is_zero()) {
            self.push(t.to, t.amount)?;
        }
        Ok(())
    }
}

/// Wallet balances plus one engine vault, all in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustody {
    balances: HashMap<AccountId, TokenAmount>,
    vault: TokenAmount,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external wallet (faucet / deposit from outside the engine).
    pub fn mint(&mut self, account: AccountId, amount: TokenAmount) {
        let entry = self.balances.entry(account).or_insert(U256::zero());
        *entry = entry.saturating_add(amount);
    }

    pub fn balance_of(&self, account: AccountId) -> TokenAmount {
        self.balances.get(&account).cloned().unwrap_or(U256::zero())
    }

    pub fn vault_balance(&self) -> TokenAmount {
        self.vault
    }
}

impl Custody for InMemoryCustody {
    fn pull(&mut self, from: AccountId, amount: TokenAmount) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        self.vault += amount;
        Ok(())
    }

    fn push(&mut self, to: AccountId, amount: TokenAmount) -> Result<(), CustodyError> {
        self.push_all(&[Transfer { to, amount }])
    }

    fn push_all(&mut self, transfers: &[Transfer]) -> Result<(), CustodyError> {
        let needed = transfers
            .iter()
            .fold(U256::zero(), |acc, t| acc.saturating_add(t.amount));
        if needed > self.vault {
            return Err(CustodyError::VaultUnderfunded {
                needed,
                held: self.vault,
            });
        }
        self.vault -= needed;
        for t in transfers.iter().filter(|t| !t.amount.is_zero()) {
            self.mint(t.to, t.amount);
        }
        Ok(())
    }
}
