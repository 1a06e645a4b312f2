use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use paylane_payments::{LedgerEntry, PaymentLog};

use super::r#trait::{LedgerStore, LedgerStoreError};

/// Ledger persisted as one pretty-printed JSON document.
///
/// Every append reads the whole file, appends in memory and rewrites the whole
/// file. There is no locking and no atomic rename: only one process may write
/// at a time, and a crash mid-write can leave a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty log if the file is absent.
    ///
    /// An existing file is left untouched.
    pub fn init(&self, at: DateTime<Utc>) -> Result<(), LedgerStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerStoreError::io(parent, e))?;
        }
        if self.path.exists() {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "initializing empty payment log");
        self.write(&PaymentLog::new(at))
    }

    fn read(&self) -> Result<PaymentLog, LedgerStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PaymentLog::default()),
            Err(e) => return Err(LedgerStoreError::io(&self.path, e)),
        };

        let log: PaymentLog = serde_json::from_str(&raw)?;
        if !log.totals_consistent() {
            tracing::warn!(
                path = %self.path.display(),
                entries = log.len(),
                "payment log totals disagree with its entries"
            );
        }
        Ok(log)
    }

    fn write(&self, log: &PaymentLog) -> Result<(), LedgerStoreError> {
        let json = serde_json::to_string_pretty(log)?;
        fs::write(&self.path, json).map_err(|e| LedgerStoreError::io(&self.path, e))
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn append(&self, entry: LedgerEntry, at: DateTime<Utc>) -> Result<(), LedgerStoreError> {
        let mut log = self.read()?;
        log.append(entry, at)?;
        self.write(&log)?;
        tracing::debug!(path = %self.path.display(), entries = log.len(), "payment log rewritten");
        Ok(())
    }

    fn load(&self) -> Result<PaymentLog, LedgerStoreError> {
        self.read()
    }
}
