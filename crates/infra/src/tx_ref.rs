//! Transaction reference strategies.
//!
//! No settlement happens, so references are synthetic. The generator is a
//! seam so tests can use predictable values.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use paylane_core::{DomainResult, TransactionRef};
use paylane_payments::PaymentRequest;

/// Produces a reference for a request being processed at `at`.
pub trait TransactionRefGenerator: Send + Sync {
    fn generate(&self, request: &PaymentRequest, at: DateTime<Utc>) -> DomainResult<TransactionRef>;
}

/// Hex SHA-256 over the request's identity, amount, currency, the processing
/// time and a per-generator nonce.
///
/// The nonce makes references from one generator distinct even when the clock
/// stands still or goes backwards. Two generators in different processes
/// carry no such guarantee.
#[derive(Debug, Default)]
pub struct Sha256TransactionRefs {
    nonce: AtomicU64,
}

impl Sha256TransactionRefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionRefGenerator for Sha256TransactionRefs {
    fn generate(&self, request: &PaymentRequest, at: DateTime<Utc>) -> DomainResult<TransactionRef> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(request.id_typed().as_uuid().as_bytes());
        hasher.update(request.amount().to_string().as_bytes());
        hasher.update(request.currency().code().as_bytes());
        hasher.update(at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
        hasher.update(nonce.to_be_bytes());

        TransactionRef::new(hex::encode(hasher.finalize()))
    }
}

/// `tx-000001`, `tx-000002`, ... in call order.
#[derive(Debug, Default)]
pub struct SequentialTransactionRefs {
    next: AtomicU64,
}

impl SequentialTransactionRefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionRefGenerator for SequentialTransactionRefs {
    fn generate(&self, _request: &PaymentRequest, _at: DateTime<Utc>) -> DomainResult<TransactionRef> {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        TransactionRef::new(format!("tx-{n:06}"))
    }
}
