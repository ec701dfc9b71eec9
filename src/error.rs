use thiserror::Error;

use crate::address::AddressError;
use crate::chain::BlockHeight;

/// Failure of a single ledger or controller operation.
///
/// Display strings are part of the external contract and match what callers
/// of the original token matched on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // Authorization
    #[error("Ownable: caller is not the owner")]
    NotOwner,
    #[error("User is blocked")]
    UserBlocked,
    #[error("Feature is only available for approved signers")]
    NotApprovedSigner,
    #[error("transferFrom and allowances not available for wBTCV secure accounts")]
    SecureAccountRestricted,
    #[error("burn method disabled")]
    BurnDisabled,

    // State
    #[error("recovering address change not ready")]
    NotReady,
    #[error("no pending recovering address change for this address")]
    NoMatchingProposal,
    #[error("no pending recovering address deletion for this address")]
    NoPendingDeletion,
    #[error("no recovering address set")]
    NoGuardian,
    #[error("Mint proposal not present")]
    MintProposalNotFound,
    #[error("Burn proposal not present")]
    BurnProposalNotFound,
    #[error("Ownership proposal not present")]
    OwnershipProposalNotFound,
    #[error("Pausable: paused")]
    Paused,
    #[error("Pausable: not paused")]
    NotPaused,

    // Invariant
    #[error("BTCV supply exceeded")]
    SupplyExceeded,
    #[error("Not enough funds to burn!")]
    InsufficientFundsToBurn,
    #[error("ERC20: transfer amount exceeds balance")]
    InsufficientBalance,
    #[error("ERC20: insufficient allowance")]
    InsufficientAllowance,
    #[error("arithmetic overflow")]
    Overflow,

    // Input
    #[error("new recovering address should not be 0, use deleteRecoveringAddress instead")]
    ZeroRecoveringAddress,
    #[error("retrieving/pushing alerts to 0 address!")]
    AlertZeroAddress,
    #[error("ERC20: transfer to the zero address")]
    TransferToZero,
    #[error("ERC20: mint to the zero address")]
    MintToZero,
    #[error("mint to the burn address")]
    MintToBurnAddress,
    #[error("ERC20: approve to the zero address")]
    ApproveToZero,
    #[error("Ownable: new owner is the zero address")]
    OwnerZeroAddress,
    #[error("There should be 3 signers")]
    InvalidSignerCount,
    #[error("block height cannot move backwards (current {current}, requested {requested})")]
    ClockRewind {
        current: BlockHeight,
        requested: BlockHeight,
    },
}

/// Coarse classification of [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    State,
    Invariant,
    Input,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            NotOwner | UserBlocked | NotApprovedSigner | SecureAccountRestricted | BurnDisabled => {
                ErrorKind::Authorization
            }
            NotReady
            | NoMatchingProposal
            | NoPendingDeletion
            | NoGuardian
            | MintProposalNotFound
            | BurnProposalNotFound
            | OwnershipProposalNotFound
            | Paused
            | NotPaused => ErrorKind::State,
            SupplyExceeded
            | InsufficientFundsToBurn
            | InsufficientBalance
            | InsufficientAllowance
            | Overflow => ErrorKind::Invariant,
            ZeroRecoveringAddress
            | AlertZeroAddress
            | TransferToZero
            | MintToZero
            | MintToBurnAddress
            | ApproveToZero
            | OwnerZeroAddress
            | InvalidSignerCount
            | ClockRewind { .. } => ErrorKind::Input,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by the node, storage and CLI layers.
#[derive(Error, Debug)]
pub enum CustodyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl From<sled::Error> for CustodyError {
    fn from(err: sled::Error) -> Self {
        CustodyError::DatabaseError(err.to_string())
    }
}

impl From<bincode::Error> for CustodyError {
    fn from(err: bincode::Error) -> Self {
        CustodyError::SerializationError(err.to_string())
    }
}
