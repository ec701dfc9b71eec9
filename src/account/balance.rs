//! Balance and allowance bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::Amount;
use crate::address::Address;

/// Plain fungible-balance store. Knows nothing about escrow, guardians or
/// ownership; the ledger layers those rules on top.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BalanceStore {
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BalanceError {
    InsufficientFunds,
    InsufficientAllowance,
    Overflow,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Credit (add) balance to an account
    pub fn credit(&mut self, account: &Address, amount: Amount) -> Result<(), BalanceError> {
        if amount == 0 {
            return Ok(());
        }

        let current = self.balance_of(account);
        let new_balance = current.checked_add(amount).ok_or(BalanceError::Overflow)?;
        self.balances.insert(*account, new_balance);
        Ok(())
    }

    /// Debit (subtract) balance from an account
    pub fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), BalanceError> {
        if amount == 0 {
            return Ok(());
        }

        let current = self.balance_of(account);
        if current < amount {
            return Err(BalanceError::InsufficientFunds);
        }

        let new_balance = current - amount;
        if new_balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, new_balance);
        }
        Ok(())
    }

    /// Move balance between two accounts. Either both sides apply or neither.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), BalanceError> {
        self.debit(from, amount)?;

        if let Err(e) = self.credit(to, amount) {
            // Rollback on error
            self.credit(from, amount).ok();
            return Err(e);
        }

        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let key = (*owner, *spender);
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }

    /// Consume `amount` of the allowance. An allowance of `Amount::MAX` is
    /// treated as unlimited and never decreases.
    pub fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), BalanceError> {
        let current = self.allowance(owner, spender);
        if current == Amount::MAX {
            return Ok(());
        }
        if current < amount {
            return Err(BalanceError::InsufficientAllowance);
        }
        self.set_allowance(owner, spender, current - amount);
        Ok(())
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        let mut holders: Vec<_> = self.balances.iter().map(|(a, b)| (*a, *b)).collect();
        holders.sort();
        holders
    }
}
