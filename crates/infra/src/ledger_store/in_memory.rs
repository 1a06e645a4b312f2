use std::sync::RwLock;

use chrono::{DateTime, Utc};

use paylane_payments::{LedgerEntry, PaymentLog};

use super::r#trait::{LedgerStore, LedgerStoreError};

/// In-memory append-only ledger.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    log: RwLock<PaymentLog>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, entry: LedgerEntry, at: DateTime<Utc>) -> Result<(), LedgerStoreError> {
        let mut log = self
            .log
            .write()
            .map_err(|_| LedgerStoreError::LockPoisoned)?;
        log.append(entry, at)?;
        Ok(())
    }

    fn load(&self) -> Result<PaymentLog, LedgerStoreError> {
        let log = self.log.read().map_err(|_| LedgerStoreError::LockPoisoned)?;
        Ok(log.clone())
    }
}
