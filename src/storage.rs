use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::CustodyError;
use crate::governance::Controller;
use crate::ledger::Ledger;

const LEDGER_KEY: &str = "state:ledger";
const CONTROLLER_KEY: &str = "state:controller";

/// Embedded snapshot store for ledger and controller state.
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CustodyError> {
        let db = sled::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "storage opened");
        Ok(Storage { db })
    }

    /// Throwaway store, removed on drop.
    pub fn temporary() -> Result<Self, CustodyError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Storage { db })
    }

    // Generic Helper: Get
    pub fn get<T: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<T>, CustodyError> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<(), CustodyError> {
        self.db.flush()?;
        Ok(())
    }

    // --- Specific Accessors ---

    /// Write the ledger and controller together. Both values are encoded
    /// first and applied as one batch, so a reader never sees one without
    /// the other. A `None` controller clears the stored one.
    pub fn save_state(&self, ledger: &Ledger, controller: Option<&Controller>) -> Result<(), CustodyError> {
        let mut batch = sled::Batch::default();
        batch.insert(LEDGER_KEY.as_bytes(), bincode::serialize(ledger)?);
        match controller {
            Some(c) => batch.insert(CONTROLLER_KEY.as_bytes(), bincode::serialize(c)?),
            None => batch.remove(CONTROLLER_KEY.as_bytes()),
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    pub fn load_ledger(&self) -> Result<Option<Ledger>, CustodyError> {
        self.get(LEDGER_KEY)
    }

    pub fn load_controller(&self) -> Result<Option<Controller>, CustodyError> {
        self.get(CONTROLLER_KEY)
    }
}
