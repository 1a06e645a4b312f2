use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use paylane_core::DomainError;
use paylane_payments::{LedgerEntry, PaymentLog};

/// Ledger store operation error.
///
/// Mostly **infrastructure errors** (IO, encoding, locking). `Rejected` carries
/// the log's own refusal of an entry, in which case nothing was written.
/// Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    #[error("ledger io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger document could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("ledger refused entry: {0}")]
    Rejected(#[from] DomainError),
}

impl LedgerStoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Append-only store for processed payments.
///
/// Implementations keep entries in append order, never rewrite an existing
/// entry, and maintain the log's running totals through
/// [`PaymentLog::append`].
///
/// No concurrency guarantee is made beyond what the implementation documents:
/// the file-backed store in particular assumes a single writer.
pub trait LedgerStore: Send + Sync {
    /// Append one entry, stamping the log's `last_updated` with `at`.
    fn append(&self, entry: LedgerEntry, at: DateTime<Utc>) -> Result<(), LedgerStoreError>;

    /// Load the full log (empty if nothing was ever written).
    fn load(&self) -> Result<PaymentLog, LedgerStoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn append(&self, entry: LedgerEntry, at: DateTime<Utc>) -> Result<(), LedgerStoreError> {
        (**self).append(entry, at)
    }

    fn load(&self) -> Result<PaymentLog, LedgerStoreError> {
        (**self).load()
    }
}
