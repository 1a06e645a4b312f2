//! Infrastructure layer: ledger storage, clocks, reference generation,
//! configuration, and the processing pipeline that composes them.

pub mod clock;
pub mod config;
pub mod ledger_store;
pub mod processor;
pub mod tx_ref;
