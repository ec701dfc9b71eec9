//! Account balances for the wBTCV ledger
//!
//! - Per-address balances and (owner, spender) allowances
//! - Read-only account snapshots for callers

pub mod types;
pub mod balance;

pub use types::{AccountSnapshot, Amount};
pub use balance::{BalanceError, BalanceStore};
