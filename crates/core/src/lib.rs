//! `paylane-core`: shared primitives for the payment ledger.
//!
//! This crate contains **pure** building blocks (no IO, no clocks, no storage).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{PaymentId, TransactionRef};
pub use value_object::ValueObject;
