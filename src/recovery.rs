//! Guardian ("recovering address") registry
//!
//! Each account may name one guardian that can cancel the account's
//! outgoing escrowed transfers. The first guardian is bound immediately.
//! Replacing or removing an established guardian is two-phase: the change
//! is proposed, and only confirmed once `wait` blocks have passed, so the
//! legitimate owner has a window to notice a hijacked key redirecting
//! recovery control.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::address::Address;
use crate::chain::BlockHeight;
use crate::error::{LedgerError, LedgerResult};

/// Target of a pending guardian change.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardianChange {
    Replace(Address),
    Delete,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingGuardianChange {
    pub change: GuardianChange,
    pub proposed_at: BlockHeight,
}

impl PendingGuardianChange {
    pub fn ready_at(&self, wait: u64) -> BlockHeight {
        self.proposed_at.saturating_add(wait)
    }
}

/// Outcome of [`RecoveryRegistry::set_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianUpdate {
    /// No guardian existed; the new one is active now.
    Applied,
    /// A guardian exists; the replacement waits for confirmation.
    Proposed { ready_at: BlockHeight },
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct GuardianSlot {
    active: Option<Address>,
    pending: Option<PendingGuardianChange>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RecoveryRegistry {
    slots: HashMap<Address, GuardianSlot>,
    wait: u64,
}

impl RecoveryRegistry {
    pub fn new(wait: u64) -> Self {
        Self {
            slots: HashMap::new(),
            wait,
        }
    }

    /// Active guardian of `account`, if any.
    pub fn guardian_of(&self, account: &Address) -> Option<Address> {
        self.slots.get(account).and_then(|slot| slot.active)
    }

    pub fn pending_change(&self, account: &Address) -> Option<PendingGuardianChange> {
        self.slots.get(account).and_then(|slot| slot.pending)
    }

    pub fn set_new(
        &mut self,
        account: Address,
        new_guardian: Address,
        now: BlockHeight,
    ) -> LedgerResult<GuardianUpdate> {
        if new_guardian.is_zero() {
            return Err(LedgerError::ZeroRecoveringAddress);
        }

        let wait = self.wait;
        let slot = self.slots.entry(account).or_default();
        match slot.active {
            None => {
                slot.active = Some(new_guardian);
                slot.pending = None;
                info!(%account, guardian = %new_guardian, "recovering address set");
                Ok(GuardianUpdate::Applied)
            }
            Some(current) => {
                let pending = PendingGuardianChange {
                    change: GuardianChange::Replace(new_guardian),
                    proposed_at: now,
                };
                if let Some(previous) = slot.pending.replace(pending) {
                    debug!(%account, ?previous, "superseding pending recovering address change");
                }
                info!(%account, %current, proposed = %new_guardian, "recovering address change proposed");
                Ok(GuardianUpdate::Proposed {
                    ready_at: pending.ready_at(wait),
                })
            }
        }
    }

    /// Commit a pending replacement. Returns the guardian it replaced.
    pub fn confirm_new(
        &mut self,
        account: Address,
        expected: Address,
        now: BlockHeight,
    ) -> LedgerResult<Option<Address>> {
        let wait = self.wait;
        let slot = self
            .slots
            .get_mut(&account)
            .ok_or(LedgerError::NoMatchingProposal)?;
        let pending = slot.pending.ok_or(LedgerError::NoMatchingProposal)?;

        if now.saturating_sub(pending.proposed_at) < wait {
            return Err(LedgerError::NotReady);
        }
        if pending.change != GuardianChange::Replace(expected) {
            return Err(LedgerError::NoMatchingProposal);
        }

        let previous = slot.active.replace(expected);
        slot.pending = None;
        info!(%account, guardian = %expected, "recovering address change confirmed");
        Ok(previous)
    }

    pub fn delete(&mut self, account: Address, now: BlockHeight) -> LedgerResult<BlockHeight> {
        let wait = self.wait;
        let slot = self.slots.get_mut(&account).ok_or(LedgerError::NoGuardian)?;
        if slot.active.is_none() {
            return Err(LedgerError::NoGuardian);
        }

        let pending = PendingGuardianChange {
            change: GuardianChange::Delete,
            proposed_at: now,
        };
        slot.pending = Some(pending);
        info!(%account, "recovering address deletion proposed");
        Ok(pending.ready_at(wait))
    }

    /// Commit a pending deletion. Returns the guardian that was removed.
    pub fn confirm_delete(&mut self, account: Address, now: BlockHeight) -> LedgerResult<Address> {
        let wait = self.wait;
        let slot = self
            .slots
            .get_mut(&account)
            .ok_or(LedgerError::NoPendingDeletion)?;
        let pending = match slot.pending {
            Some(p) if p.change == GuardianChange::Delete => p,
            _ => return Err(LedgerError::NoPendingDeletion),
        };

        if now.saturating_sub(pending.proposed_at) < wait {
            return Err(LedgerError::NotReady);
        }

        let removed = slot.active.take().ok_or(LedgerError::NoGuardian)?;
        self.slots.remove(&account);
        info!(%account, guardian = %removed, "recovering address deleted");
        Ok(removed)
    }
}
