//! Account type definitions

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Token amount in base units (1 wBTCV = 10^8 units).
pub type Amount = u128;

/// Point-in-time view of one account, as reported by the ledger.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub address: Address,
    pub balance: Amount,
    pub blocked: bool,
    pub guardian: Option<Address>,
    /// Amount this account has sent into escrow that is still pending.
    pub escrowed_out: Amount,
    /// Amount waiting in this account's incoming alert queue.
    pub incoming: Amount,
}
