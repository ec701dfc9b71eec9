//! Serialized access to a deployed ledger.
//!
//! `CustodyNode` puts the ledger and its controller behind one mutex so
//! every operation runs to completion before the next starts, and writes
//! the resulting state through to storage. An operation that fails leaves
//! both memory and storage as they were. Events are drained on every
//! commit and handed back to the caller; they are never persisted.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::chain::BlockHeight;
use crate::config::WbtcvConfig;
use crate::error::CustodyError;
use crate::events::LedgerEvent;
use crate::governance::Controller;
use crate::ledger::Ledger;
use crate::storage::Storage;

pub type CommittedEvents = Vec<(BlockHeight, LedgerEvent)>;

#[derive(Clone, Debug)]
pub struct CustodyState {
    pub ledger: Ledger,
    pub controller: Option<Controller>,
}

impl CustodyState {
    /// Split borrow for controller calls, which need the ledger alongside.
    pub fn governed(&mut self) -> Result<(&mut Controller, &mut Ledger), CustodyError> {
        match self.controller.as_mut() {
            Some(controller) => Ok((controller, &mut self.ledger)),
            None => Err(CustodyError::InvalidState(
                "ledger was deployed without a governance controller".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct CustodyNode {
    state: Arc<Mutex<CustodyState>>,
    storage: Option<Arc<Storage>>,
}

impl CustodyNode {
    /// Deploy a fresh ledger: the deployer owns it first, then hands
    /// ownership to the controller when signers are configured.
    pub fn deploy(config: &WbtcvConfig, storage: Option<Arc<Storage>>) -> Result<Self, CustodyError> {
        config.validate()?;
        let deployer = config.deployer()?;
        let mut ledger = Ledger::new(config.token_params(), deployer);

        let signers = config.signers()?;
        let controller = if signers.is_empty() {
            warn!(%deployer, "no signers configured; deployer keeps direct ownership");
            None
        } else {
            let controller = Controller::new(config.controller()?, &signers)?;
            ledger.transfer_ownership(&deployer, &controller.address())?;
            Some(controller)
        };

        let node = Self {
            state: Arc::new(Mutex::new(CustodyState { ledger, controller })),
            storage,
        };
        {
            let mut state = node.lock()?;
            let deploy_events = state.ledger.drain_events();
            debug!(count = deploy_events.len(), "deployment events drained");
            node.persist(&state)?;
        }
        info!(persistent = node.storage.is_some(), "custody node ready");
        Ok(node)
    }

    /// Resume the ledger stored in `storage`, deploying one if it is empty.
    pub fn open(config: &WbtcvConfig, storage: Arc<Storage>) -> Result<Self, CustodyError> {
        match storage.load_ledger()? {
            Some(ledger) => {
                let controller = storage.load_controller()?;
                info!(
                    block = ledger.block_number(),
                    supply = ledger.total_supply(),
                    governed = controller.is_some(),
                    "Persistence: ledger state loaded"
                );
                Ok(Self {
                    state: Arc::new(Mutex::new(CustodyState { ledger, controller })),
                    storage: Some(storage),
                })
            }
            None => {
                info!("Persistence: no stored ledger, deploying");
                Self::deploy(config, Some(storage))
            }
        }
    }

    /// Wrap existing state without persistence.
    pub fn in_memory(ledger: Ledger, controller: Option<Controller>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CustodyState { ledger, controller })),
            storage: None,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CustodyState>, CustodyError> {
        self.state.lock().map_err(|_| CustodyError::LockPoisoned)
    }

    fn persist(&self, state: &CustodyState) -> Result<(), CustodyError> {
        if let Some(storage) = &self.storage {
            storage.save_state(&state.ledger, state.controller.as_ref())?;
            storage.flush()?;
        }
        Ok(())
    }

    /// Put the pre-operation snapshot back after a failed write-through.
    fn restore(&self, before: &CustodyState) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_state(&before.ledger, before.controller.as_ref()) {
                warn!("Persistence: could not restore previous snapshot: {}", e);
            }
        }
    }

    /// Run one mutating operation atomically.
    ///
    /// The state is restored if `op` fails, so a closure that chains several
    /// ledger calls is still all-or-nothing.
    pub fn execute<T, F>(&self, op: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&mut CustodyState) -> Result<T, CustodyError>,
    {
        self.execute_with_events(op).map(|(value, _)| value)
    }

    /// Like [`execute`](Self::execute), also returning the events the
    /// operation emitted.
    pub fn execute_with_events<T, F>(&self, op: F) -> Result<(T, CommittedEvents), CustodyError>
    where
        F: FnOnce(&mut CustodyState) -> Result<T, CustodyError>,
    {
        let mut state = self.lock()?;
        let before = state.clone();

        let value = match op(&mut state) {
            Ok(value) => value,
            Err(e) => {
                *state = before;
                return Err(e);
            }
        };

        let events = state.ledger.drain_events();
        if let Err(e) = self.persist(&state) {
            self.restore(&before);
            *state = before;
            return Err(e);
        }

        for (block, event) in &events {
            debug!(block, ?event, "ledger event");
        }
        Ok((value, events))
    }

    /// Read-only view of the current state.
    pub fn query<T, F>(&self, view: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&CustodyState) -> T,
    {
        let state = self.lock()?;
        Ok(view(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::error::LedgerError;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_deploy_hands_ownership_to_controller() {
        let config = WbtcvConfig::default();
        let node = CustodyNode::deploy(&config, None).unwrap();
        let (owner, controller) = node
            .query(|s| (s.ledger.owner(), s.controller.as_ref().map(|c| c.address())))
            .unwrap();
        assert_eq!(Some(owner), controller);
        assert_eq!(owner, addr("controller"));
    }

    #[test]
    fn test_deploy_without_signers() {
        let mut config = WbtcvConfig::default();
        config.governance.signers.clear();
        let node = CustodyNode::deploy(&config, None).unwrap();
        let owner = node.query(|s| s.ledger.owner()).unwrap();
        assert_eq!(owner, addr("deployer"));

        let err = node
            .execute(|s| s.governed().map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, CustodyError::InvalidState(_)));
    }

    #[test]
    fn test_failed_execute_rolls_back() {
        let node = CustodyNode::deploy(&WbtcvConfig::default(), None).unwrap();
        let result = node.execute(|s| {
            let (ctl, ledger) = s.governed()?;
            ctl.mint(ledger, &addr("signer-a"), &addr("x"), 5)?;
            // no second signer: the proposal above must not survive
            ctl.sign_mint(ledger, &addr("outsider"), &addr("x"), 5)?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(CustodyError::Ledger(LedgerError::NotApprovedSigner))
        ));
        let pending = node
            .query(|s| s.controller.as_ref().map(|c| c.mints_count()))
            .unwrap();
        assert_eq!(pending, Some(0));
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = WbtcvConfig::default();
        {
            let storage = Arc::new(Storage::open(dir.path()).unwrap());
            let node = CustodyNode::open(&config, storage).unwrap();
            node.execute(|s| {
                let (ctl, ledger) = s.governed()?;
                ctl.mint(ledger, &addr("signer-a"), &addr("x"), 7)?;
                ctl.sign_mint(ledger, &addr("signer-b"), &addr("x"), 7)?;
                ledger.advance_blocks(3);
                Ok(())
            })
            .unwrap();
        }

        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let node = CustodyNode::open(&config, storage).unwrap();
        let (balance, block) = node
            .query(|s| (s.ledger.balance_of(&addr("x")), s.ledger.block_number()))
            .unwrap();
        assert_eq!(balance, 7);
        assert_eq!(block, 3);
    }

    #[test]
    fn test_events_are_drained_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let config = WbtcvConfig::default();
        let x = addr("x");
        {
            let storage = Arc::new(Storage::open(dir.path()).unwrap());
            let node = CustodyNode::open(&config, storage).unwrap();
            for _ in 0..50 {
                let ((), events) = node
                    .execute_with_events(|s| {
                        let (ctl, ledger) = s.governed()?;
                        ctl.mint(ledger, &addr("signer-a"), &x, 1)?;
                        ctl.sign_mint(ledger, &addr("signer-b"), &x, 1)?;
                        Ok(())
                    })
                    .unwrap();
                assert_eq!(events.len(), 1);
            }
            node.execute(|s| Ok(s.ledger.transfer(&x, &addr("y"), 5)?))
                .unwrap();
            assert!(node.query(|s| s.ledger.events().is_empty()).unwrap());
        }

        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let node = CustodyNode::open(&config, storage).unwrap();
        let (pending, balance) = node
            .query(|s| (s.ledger.events().len(), s.ledger.balance_of(&x)))
            .unwrap();
        assert_eq!(pending, 0);
        assert_eq!(balance, 45);
    }
}
