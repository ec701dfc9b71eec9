//! Governance controller
//!
//! The controller is the ledger's owner. It holds supply-changing and
//! ownership-changing actions pending until a second approved signer
//! co-signs them (2-of-3), and lets any single approved signer apply the
//! reversible defensive actions (block/unblock a user, pause/unpause).
//!
//! Every call receives the ledger explicitly; the controller never keeps a
//! reference to it.

pub mod proposals;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::Amount;
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

pub use proposals::{Proposal, ProposalBook, ProposalId};

pub const SIGNER_COUNT: usize = 3;

/// Arguments of a mint proposal. Signing requires an exact match.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MintArgs {
    pub to: Address,
    pub amount: Amount,
}

/// The fixed set of approved signers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SignerSet([Address; SIGNER_COUNT]);

impl SignerSet {
    /// Exactly three distinct, non-zero addresses.
    pub fn new(signers: &[Address]) -> LedgerResult<Self> {
        let set: [Address; SIGNER_COUNT] = signers
            .try_into()
            .map_err(|_| LedgerError::InvalidSignerCount)?;

        let distinct = set[0] != set[1] && set[0] != set[2] && set[1] != set[2];
        if !distinct || set.iter().any(Address::is_zero) {
            return Err(LedgerError::InvalidSignerCount);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Controller {
    /// Identity the controller acts as on the ledger.
    address: Address,
    signers: SignerSet,
    mints: ProposalBook<MintArgs>,
    burns: ProposalBook<Amount>,
    ownership: ProposalBook<Address>,
}

impl Controller {
    pub fn new(address: Address, signers: &[Address]) -> LedgerResult<Self> {
        let signers = SignerSet::new(signers)?;
        info!(controller = %address, "governance controller created");
        Ok(Self {
            address,
            signers,
            mints: ProposalBook::new(),
            burns: ProposalBook::new(),
            ownership: ProposalBook::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    fn ensure_signer(&self, caller: &Address) -> LedgerResult<()> {
        if !self.is_signer(caller) {
            warn!(%caller, controller = %self.address, "call from unapproved signer");
            return Err(LedgerError::NotApprovedSigner);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mint
    // ---------------------------------------------------------------------

    /// Propose minting `amount` to `to`.
    pub fn mint(&mut self, ledger: &Ledger, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<ProposalId> {
        self.ensure_signer(caller)?;
        if to.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        if to.is_burn() {
            return Err(LedgerError::MintToBurnAddress);
        }

        let args = MintArgs { to: *to, amount };
        let id = self.mints.propose(args, *caller, ledger.block_number());
        info!(id, proposer = %caller, %to, amount, "mint proposed");
        Ok(id)
    }

    /// Co-sign a matching mint proposal and execute it.
    pub fn sign_mint(&mut self, ledger: &mut Ledger, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        let args = MintArgs { to: *to, amount };
        let id = self
            .mints
            .find_cosignable(&args, caller)
            .ok_or(LedgerError::MintProposalNotFound)?;

        ledger.mint(&self.address, to, amount)?;
        self.mints.remove(id);
        info!(id, signer = %caller, %to, amount, "mint signed and executed");
        Ok(())
    }

    pub fn mints_count(&self) -> usize {
        self.mints.len()
    }

    pub fn pending_mints(&self) -> impl Iterator<Item = &Proposal<MintArgs>> {
        self.mints.iter()
    }

    // ---------------------------------------------------------------------
    // Burn
    // ---------------------------------------------------------------------

    /// Propose burning `amount` from the controller's own balance.
    pub fn burn(&mut self, ledger: &Ledger, caller: &Address, amount: Amount) -> LedgerResult<ProposalId> {
        self.ensure_signer(caller)?;
        if ledger.balance_of(&self.address) < amount {
            return Err(LedgerError::InsufficientFundsToBurn);
        }

        let id = self.burns.propose(amount, *caller, ledger.block_number());
        info!(id, proposer = %caller, amount, "burn proposed");
        Ok(id)
    }

    /// Co-sign a matching burn proposal and execute it. The balance is
    /// checked again since earlier burns may have drawn it down.
    pub fn sign_burn(&mut self, ledger: &mut Ledger, caller: &Address, amount: Amount) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        let id = self
            .burns
            .find_cosignable(&amount, caller)
            .ok_or(LedgerError::BurnProposalNotFound)?;
        if ledger.balance_of(&self.address) < amount {
            return Err(LedgerError::InsufficientFundsToBurn);
        }

        ledger.governance_burn(&self.address, amount)?;
        self.burns.remove(id);
        info!(id, signer = %caller, amount, "burn signed and executed");
        Ok(())
    }

    pub fn burns_count(&self) -> usize {
        self.burns.len()
    }

    pub fn pending_burns(&self) -> impl Iterator<Item = &Proposal<Amount>> {
        self.burns.iter()
    }

    // ---------------------------------------------------------------------
    // Ownership
    // ---------------------------------------------------------------------

    /// Propose handing ledger ownership to `new_owner`.
    pub fn transfer_ownership(&mut self, ledger: &Ledger, caller: &Address, new_owner: &Address) -> LedgerResult<ProposalId> {
        self.ensure_signer(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::OwnerZeroAddress);
        }

        let id = self.ownership.propose(*new_owner, *caller, ledger.block_number());
        info!(id, proposer = %caller, %new_owner, "ownership transfer proposed");
        Ok(id)
    }

    /// Co-sign a matching ownership proposal. Once executed the ledger no
    /// longer answers to this controller.
    pub fn sign_ownership_transfer(&mut self, ledger: &mut Ledger, caller: &Address, new_owner: &Address) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        let id = self
            .ownership
            .find_cosignable(new_owner, caller)
            .ok_or(LedgerError::OwnershipProposalNotFound)?;

        ledger.transfer_ownership(&self.address, new_owner)?;
        self.ownership.remove(id);
        info!(id, signer = %caller, %new_owner, "ownership transfer signed and executed");
        Ok(())
    }

    pub fn ownership_proposals_count(&self) -> usize {
        self.ownership.len()
    }

    pub fn pending_ownership_transfers(&self) -> impl Iterator<Item = &Proposal<Address>> {
        self.ownership.iter()
    }

    // ---------------------------------------------------------------------
    // Single-signer actions
    // ---------------------------------------------------------------------

    pub fn block_user(&self, ledger: &mut Ledger, caller: &Address, user: &Address) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        ledger.block_user(&self.address, user)
    }

    pub fn unblock_user(&self, ledger: &mut Ledger, caller: &Address, user: &Address) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        ledger.unblock_user(&self.address, user)
    }

    pub fn pause_token(&self, ledger: &mut Ledger, caller: &Address) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        ledger.pause(&self.address)
    }

    pub fn unpause_token(&self, ledger: &mut Ledger, caller: &Address) -> LedgerResult<()> {
        self.ensure_signer(caller)?;
        ledger.unpause(&self.address)
    }
}
