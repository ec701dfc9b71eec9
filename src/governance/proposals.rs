//! Pending proposals awaiting a second signer
//!
//! Proposals are kept in proposal order, indexed by their arguments so a
//! signer's matching call finds a co-signable entry without scanning the
//! whole book. Identical proposals are never merged; each one needs its own
//! signature.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use crate::address::Address;
use crate::chain::BlockHeight;

pub type ProposalId = u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Proposal<K> {
    pub id: ProposalId,
    pub args: K,
    /// Signer that created the proposal; it cannot also approve it.
    pub proposer: Address,
    pub proposed_at: BlockHeight,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProposalBook<K: Eq + Hash> {
    entries: BTreeMap<ProposalId, Proposal<K>>,
    by_args: HashMap<K, BTreeSet<ProposalId>>,
    next_id: ProposalId,
}

impl<K: Eq + Hash + Clone> ProposalBook<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_args: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn propose(&mut self, args: K, proposer: Address, now: BlockHeight) -> ProposalId {
        let id = self.next_id;
        self.next_id += 1;

        self.by_args.entry(args.clone()).or_default().insert(id);
        self.entries.insert(
            id,
            Proposal {
                id,
                args,
                proposer,
                proposed_at: now,
            },
        );
        id
    }

    /// Oldest proposal with these exact arguments that `signer` did not
    /// create itself.
    pub fn find_cosignable(&self, args: &K, signer: &Address) -> Option<ProposalId> {
        self.by_args
            .get(args)?
            .iter()
            .copied()
            .find(|id| {
                self.entries
                    .get(id)
                    .map(|p| p.proposer != *signer)
                    .unwrap_or(false)
            })
    }

    pub fn remove(&mut self, id: ProposalId) -> Option<Proposal<K>> {
        let proposal = self.entries.remove(&id)?;
        if let Some(ids) = self.by_args.get_mut(&proposal.args) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_args.remove(&proposal.args);
            }
        }
        Some(proposal)
    }

    /// Pending proposals, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal<K>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for ProposalBook<K> {
    fn default() -> Self {
        Self::new()
    }
}
