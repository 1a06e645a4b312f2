//! Payments module (fee schedule, payment requests, append-only payment log).
//!
//! Pure domain logic only: no IO, no clocks, no persistence concerns. Callers
//! pass identifiers and timestamps in explicitly.

pub mod currency;
pub mod fees;
pub mod ledger;
mod money;
pub mod request;
pub mod response;
pub mod stats;

pub use currency::Currency;
pub use fees::{FeeBreakdown, FeeSchedule, SegmentProfile};
pub use ledger::{LedgerEntry, PaymentLog};
pub use request::{PaymentDraft, PaymentRequest};
pub use response::{PaymentResponse, PaymentStatus};
pub use stats::SegmentStats;
