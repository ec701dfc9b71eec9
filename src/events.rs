//! Ledger events, one per committed state transition.

use serde::{Deserialize, Serialize};

use crate::account::Amount;
use crate::address::Address;
use crate::alert::{AlertEntry, AlertId};
use crate::chain::BlockHeight;

/// Payload shared by the three alert events.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AlertEvent {
    pub id: AlertId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub cancel_account: Address,
}

impl From<&AlertEntry> for AlertEvent {
    fn from(entry: &AlertEntry) -> Self {
        Self {
            id: entry.id,
            sender: entry.sender,
            recipient: entry.recipient,
            amount: entry.amount,
            cancel_account: entry.cancel_account,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Transfer { from: Address, to: Address, amount: Amount },
    Approval { owner: Address, spender: Address, amount: Amount },
    Mint { to: Address, amount: Amount },
    Burn { from: Address, amount: Amount },
    OwnershipTransferred { previous: Address, new_owner: Address },
    Paused { by: Address },
    Unpaused { by: Address },
    UserBlocked { user: Address },
    UserUnblocked { user: Address },
    RecoveringAddressSet { account: Address, guardian: Address },
    RecoveringAddressChangeProposed { account: Address, guardian: Address, ready_at: BlockHeight },
    RecoveringAddressDeleteProposed { account: Address, ready_at: BlockHeight },
    RecoveringAddressDeleted { account: Address, guardian: Address },
    SentAlert(AlertEvent),
    RedeemedAlert(AlertEvent),
    CancelledAlert(AlertEvent),
}

/// Events recorded with the block they happened in.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EventLog {
    entries: Vec<(BlockHeight, LedgerEvent)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, block: BlockHeight, event: LedgerEvent) {
        self.entries.push((block, event));
    }

    /// Take every recorded event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<(BlockHeight, LedgerEvent)> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
