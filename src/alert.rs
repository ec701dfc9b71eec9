//! Escrowed, time-locked incoming transfers ("alerts")
//!
//! A transfer sent by an account with a guardian does not land in the
//! recipient's balance. It is parked here, tagged with the sender's guardian
//! at send time, until either the lock period elapses and the recipient
//! redeems it, or that guardian cancels it and the sender is refunded.
//!
//! Entries are stored per recipient in a `BTreeMap` keyed by a global
//! sequence id, with a secondary `(recipient, guardian)` index so a cancel
//! touches only the guardian's own entries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::account::Amount;
use crate::address::Address;
use crate::chain::BlockHeight;

pub type AlertId = u64;

/// Default lock period: one day of 3 second blocks.
pub const DEFAULT_ALERT_BLOCK_WAIT: u64 = 28_800;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AlertEntry {
    pub id: AlertId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: Amount,
    /// Guardian of `sender` when the transfer was made.
    pub cancel_account: Address,
    pub block_number: BlockHeight,
}

impl AlertEntry {
    pub fn is_ready(&self, now: BlockHeight, wait: u64) -> bool {
        now.saturating_sub(self.block_number) >= wait
    }

    pub fn ready_at(&self, wait: u64) -> BlockHeight {
        self.block_number.saturating_add(wait)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlertQueue {
    queues: HashMap<Address, BTreeMap<AlertId, AlertEntry>>,
    by_guardian: HashMap<(Address, Address), BTreeSet<AlertId>>,
    /// sender -> amount still in escrow
    outgoing: HashMap<Address, Amount>,
    total: Amount,
    next_id: AlertId,
    wait: u64,
}

impl AlertQueue {
    pub fn new(wait: u64) -> Self {
        Self {
            queues: HashMap::new(),
            by_guardian: HashMap::new(),
            outgoing: HashMap::new(),
            total: 0,
            next_id: 0,
            wait,
        }
    }

    pub fn push(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: Amount,
        cancel_account: Address,
        now: BlockHeight,
    ) -> AlertEntry {
        let id = self.next_id;
        self.next_id += 1;

        let entry = AlertEntry {
            id,
            sender,
            recipient,
            amount,
            cancel_account,
            block_number: now,
        };

        self.queues
            .entry(recipient)
            .or_default()
            .insert(id, entry.clone());
        self.by_guardian
            .entry((recipient, cancel_account))
            .or_default()
            .insert(id);
        *self.outgoing.entry(sender).or_insert(0) += amount;
        self.total += amount;

        entry
    }

    /// Every entry addressed to `recipient`, oldest first.
    pub fn incoming(&self, recipient: &Address) -> impl Iterator<Item = &AlertEntry> {
        self.queues.get(recipient).into_iter().flat_map(|q| q.values())
    }

    /// Entries whose lock period has elapsed at `now`.
    ///
    /// Ids grow with block height, so the ready entries form a prefix of the
    /// queue.
    pub fn ready(&self, recipient: &Address, now: BlockHeight) -> impl Iterator<Item = &AlertEntry> {
        let wait = self.wait;
        self.incoming(recipient)
            .take_while(move |entry| entry.is_ready(now, wait))
    }

    /// Remove and return every ready entry for `recipient`.
    pub fn take_ready(&mut self, recipient: &Address, now: BlockHeight) -> Vec<AlertEntry> {
        let ids: Vec<AlertId> = self.ready(recipient, now).map(|e| e.id).collect();
        ids.into_iter()
            .filter_map(|id| self.remove(recipient, id))
            .collect()
    }

    /// Remove and return the entries for `recipient` that `guardian` may
    /// cancel. Entries guarded by anyone else stay queued.
    pub fn take_cancellable(&mut self, recipient: &Address, guardian: &Address) -> Vec<AlertEntry> {
        let ids = match self.by_guardian.get(&(*recipient, *guardian)) {
            Some(ids) => ids.iter().copied().collect::<Vec<_>>(),
            None => return Vec::new(),
        };
        ids.into_iter()
            .filter_map(|id| self.remove(recipient, id))
            .collect()
    }

    fn remove(&mut self, recipient: &Address, id: AlertId) -> Option<AlertEntry> {
        let queue = self.queues.get_mut(recipient)?;
        let entry = queue.remove(&id)?;
        if queue.is_empty() {
            self.queues.remove(recipient);
        }

        let key = (*recipient, entry.cancel_account);
        if let Some(ids) = self.by_guardian.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_guardian.remove(&key);
            }
        }

        if let Some(out) = self.outgoing.get_mut(&entry.sender) {
            *out -= entry.amount;
            if *out == 0 {
                self.outgoing.remove(&entry.sender);
            }
        }
        self.total -= entry.amount;

        Some(entry)
    }

    /// Amount `sender` has in escrow across all recipients.
    pub fn pending_from(&self, sender: &Address) -> Amount {
        self.outgoing.get(sender).copied().unwrap_or(0)
    }

    /// Amount waiting for `recipient`, ready or not.
    pub fn pending_to(&self, recipient: &Address) -> Amount {
        self.incoming(recipient).map(|e| e.amount).sum()
    }

    pub fn total_pending(&self) -> Amount {
        self.total
    }

    pub fn len(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: u64 = 10;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_push_and_incoming() {
        let mut queue = AlertQueue::new(WAIT);
        queue.push(addr("x"), addr("y"), 5, addr("g"), 0);
        queue.push(addr("z"), addr("y"), 7, addr("h"), 1);

        let incoming: Vec<_> = queue.incoming(&addr("y")).collect();
        assert_eq!(incoming.len(), 2);
        assert_eq!(incoming[0].sender, addr("x"));
        assert_eq!(incoming[1].sender, addr("z"));
        assert_eq!(queue.pending_to(&addr("y")), 12);
        assert_eq!(queue.pending_from(&addr("x")), 5);
        assert_eq!(queue.total_pending(), 12);
        assert_eq!(queue.incoming(&addr("x")).count(), 0);
    }

    #[test]
    fn test_ready_is_prefix_by_age() {
        let mut queue = AlertQueue::new(WAIT);
        queue.push(addr("x"), addr("y"), 1, addr("g"), 0);
        queue.push(addr("x"), addr("y"), 2, addr("g"), 5);

        assert_eq!(queue.ready(&addr("y"), 9).count(), 0);
        assert_eq!(queue.ready(&addr("y"), 10).count(), 1);
        assert_eq!(queue.ready(&addr("y"), 15).count(), 2);
    }

    #[test]
    fn test_take_ready_leaves_young_entries() {
        let mut queue = AlertQueue::new(WAIT);
        queue.push(addr("x"), addr("y"), 1, addr("g"), 0);
        queue.push(addr("x"), addr("y"), 2, addr("g"), 5);

        let taken = queue.take_ready(&addr("y"), 12);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].amount, 1);
        assert_eq!(queue.incoming(&addr("y")).count(), 1);
        assert_eq!(queue.pending_from(&addr("x")), 2);
        assert_eq!(queue.total_pending(), 2);
    }

    #[test]
    fn test_cancel_only_touches_own_entries() {
        let mut queue = AlertQueue::new(WAIT);
        queue.push(addr("x"), addr("y"), 1, addr("g"), 0);
        queue.push(addr("z"), addr("y"), 2, addr("h"), 0);
        queue.push(addr("x"), addr("y"), 3, addr("g"), 1);

        assert!(queue.take_cancellable(&addr("y"), &addr("nobody")).is_empty());

        let cancelled = queue.take_cancellable(&addr("y"), &addr("g"));
        assert_eq!(cancelled.iter().map(|e| e.amount).sum::<Amount>(), 4);
        let left: Vec<_> = queue.incoming(&addr("y")).collect();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].cancel_account, addr("h"));
        assert_eq!(queue.pending_from(&addr("x")), 0);
    }

    #[test]
    fn test_empty_queues_are_pruned() {
        let mut queue = AlertQueue::new(0);
        queue.push(addr("x"), addr("y"), 1, addr("g"), 0);
        queue.take_ready(&addr("y"), 0);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.total_pending(), 0);
    }
}
