//! Append-only payment ledger boundary.
//!
//! The processor only sees [`LedgerStore`]; callers pick the backend
//! (in-memory for tests, JSON file for the CLI).

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use json_file::JsonFileLedgerStore;
pub use r#trait::{LedgerStore, LedgerStoreError};
