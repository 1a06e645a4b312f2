use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paylane_core::{DomainError, DomainResult, ValueObject};

use crate::ledger::LedgerEntry;
use crate::money::exact_add;

/// Aggregate figures over a set of log entries.
///
/// Volumes are summed across currencies as recorded; callers that need
/// per-currency figures should filter first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStats {
    /// `None` means "all segments" (or "unsegmented", depending on the query).
    pub segment: Option<String>,
    pub count: u64,
    pub total_volume: Decimal,
    pub total_fees: Decimal,
    /// Mean amount per payment; zero when there are none.
    pub average_transaction: Decimal,
    /// Sum of fees waived through segment discounts.
    pub fee_savings: Decimal,
}

impl ValueObject for SegmentStats {}

impl SegmentStats {
    pub fn collect<'a>(
        segment: Option<String>,
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
    ) -> DomainResult<Self> {
        let mut count: u64 = 0;
        let mut total_volume = Decimal::ZERO;
        let mut total_fees = Decimal::ZERO;
        let mut fee_savings = Decimal::ZERO;

        let overflow = || DomainError::invariant("segment totals exceed decimal precision");
        for e in entries {
            count += 1;
            total_volume = exact_add(total_volume, e.amount).ok_or_else(overflow)?;
            total_fees = exact_add(total_fees, e.fee).ok_or_else(overflow)?;
            fee_savings = exact_add(fee_savings, e.discount_amount).ok_or_else(overflow)?;
        }

        let average_transaction = if count == 0 {
            Decimal::ZERO
        } else {
            (total_volume / Decimal::from(count)).normalize()
        };

        Ok(Self {
            segment,
            count,
            total_volume: total_volume.normalize(),
            total_fees: total_fees.normalize(),
            average_transaction,
            fee_savings: fee_savings.normalize(),
        })
    }
}
