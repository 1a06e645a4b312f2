use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paylane_core::{DomainError, DomainResult, PaymentId, TransactionRef};

use crate::currency::Currency;
use crate::fees::normalize_segment;
use crate::money::{exact_add, exact_sum};
use crate::request::PaymentRequest;
use crate::response::{PaymentResponse, PaymentStatus};
use crate::stats::SegmentStats;

/// One processed payment, as recorded in the log (immutable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub currency: Currency,
    pub segment: Option<String>,
    pub status: PaymentStatus,
    pub transaction_ref: Option<TransactionRef>,
    pub fee: Decimal,
    pub net_amount: Decimal,
    /// Fee waived by the segment discount. Older logs lack it.
    #[serde(default)]
    pub discount_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// Build the log record for a processed request.
    pub fn record(request: &PaymentRequest, response: &PaymentResponse) -> DomainResult<Self> {
        if response.payment_id != request.id_typed() {
            return Err(DomainError::invariant(format!(
                "response {} does not belong to request {}",
                response.payment_id,
                request.id_typed()
            )));
        }
        if !response.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "payment {} is still {} and cannot be recorded",
                response.payment_id, response.status
            )));
        }

        Ok(Self {
            payment_id: request.id_typed(),
            amount: request.amount(),
            currency: request.currency(),
            segment: request.segment().map(str::to_string),
            status: response.status,
            transaction_ref: response.transaction_ref.clone(),
            fee: response.fee,
            net_amount: response.net_amount,
            discount_amount: response.discount_amount,
            created_at: response.created_at,
            completed_at: response.completed_at,
        })
    }
}

/// The append-only payment log document.
///
/// Running totals are maintained on every append; entries are never mutated or
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentLog {
    payments: Vec<LedgerEntry>,
    total_volume: Decimal,
    total_fees: Decimal,
    last_updated: Option<DateTime<Utc>>,
}

impl PaymentLog {
    /// Empty log stamped with its creation time.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(at),
            ..Self::default()
        }
    }

    /// Record an entry. Fails, leaving the log untouched, when a running total
    /// can no longer be represented exactly.
    pub fn append(&mut self, entry: LedgerEntry, at: DateTime<Utc>) -> DomainResult<()> {
        let overflow = || {
            DomainError::invariant(format!(
                "payment {} would push ledger totals past decimal precision",
                entry.payment_id
            ))
        };
        let total_volume = exact_add(self.total_volume, entry.amount).ok_or_else(overflow)?;
        let total_fees = exact_add(self.total_fees, entry.fee).ok_or_else(overflow)?;

        self.total_volume = total_volume;
        self.total_fees = total_fees;
        self.last_updated = Some(at);
        self.payments.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.payments
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn total_volume(&self) -> Decimal {
        self.total_volume
    }

    pub fn total_fees(&self) -> Decimal {
        self.total_fees
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Whether the stored totals agree with the entries (a hand-edited or
    /// half-written file may not).
    pub fn totals_consistent(&self) -> bool {
        let volume = exact_sum(self.payments.iter().map(|e| e.amount));
        let fees = exact_sum(self.payments.iter().map(|e| e.fee));
        volume == Some(self.total_volume) && fees == Some(self.total_fees)
    }

    /// Statistics across all entries, or only those of one segment.
    pub fn stats(&self, segment: Option<&str>) -> DomainResult<SegmentStats> {
        match segment {
            Some(name) => {
                let key = normalize_segment(name);
                SegmentStats::collect(
                    Some(key.clone()),
                    self.payments
                        .iter()
                        .filter(|e| e.segment.as_deref() == Some(key.as_str())),
                )
            }
            None => SegmentStats::collect(None, self.payments.iter()),
        }
    }

    /// Distinct segment names recorded in the log, sorted.
    pub fn recorded_segments(&self) -> BTreeSet<&str> {
        self.payments.iter().filter_map(|e| e.segment.as_deref()).collect()
    }

    /// Statistics for entries that carry no segment at all.
    pub fn unsegmented_stats(&self) -> DomainResult<SegmentStats> {
        SegmentStats::collect(None, self.payments.iter().filter(|e| e.segment.is_none()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeSchedule;
    use crate::request::PaymentDraft;
    use chrono::TimeZone;
    use core::str::FromStr;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn entry(amount: Decimal, segment: Option<&str>, n: usize) -> LedgerEntry {
        let mut draft = PaymentDraft::new(amount, Currency::Usdt, "wallet");
        if let Some(s) = segment {
            draft = draft.segment(s);
        }
        let schedule = FeeSchedule::default().validated().unwrap();
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule, t0()).unwrap();
        let tx = TransactionRef::new(format!("tx-{n}")).unwrap();
        let resp = PaymentResponse::completed(&req, tx, t0());
        LedgerEntry::record(&req, &resp).unwrap()
    }

    #[test]
    fn append_maintains_totals_and_order() {
        let mut log = PaymentLog::new(t0());
        log.append(entry(d("75"), Some("indigenous"), 1), t0()).unwrap();
        log.append(entry(d("45"), Some("rural_farmers"), 2), t0()).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.total_volume(), d("120"));
        assert_eq!(log.total_fees(), d("0.0510"));
        assert_eq!(log.entries()[0].amount, d("75"));
        assert!(log.totals_consistent());
    }

    #[test]
    fn append_refuses_totals_beyond_precision() {
        let schedule = FeeSchedule::default().validated().unwrap();
        let huge = |n: usize| {
            let draft = PaymentDraft::new(d("50000000000000000000000000000"), Currency::Cad, "w");
            let req = PaymentRequest::create(PaymentId::new(), draft, &schedule, t0()).unwrap();
            let tx = TransactionRef::new(format!("tx-{n}")).unwrap();
            LedgerEntry::record(&req, &PaymentResponse::completed(&req, tx, t0())).unwrap()
        };

        let mut log = PaymentLog::new(t0());
        log.append(huge(1), t0()).unwrap();
        let err = log.append(huge(2), t0()).unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.total_volume(), d("50000000000000000000000000000"));
        assert!(log.totals_consistent());
    }

    #[test]
    fn record_rejects_mismatched_response() {
        let a = entry(d("10"), None, 1);
        let schedule = FeeSchedule::default().validated().unwrap();
        let req = PaymentRequest::create(
            PaymentId::new(),
            PaymentDraft::new(d("10"), Currency::Usdt, "w"),
            &schedule,
            t0(),
        )
        .unwrap();
        let mut resp = PaymentResponse::completed(&req, TransactionRef::new("tx").unwrap(), t0());
        resp.payment_id = a.payment_id;

        let err = LedgerEntry::record(&req, &resp).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn record_rejects_unfinished_payment() {
        let schedule = FeeSchedule::default().validated().unwrap();
        let req = PaymentRequest::create(
            PaymentId::new(),
            PaymentDraft::new(d("10"), Currency::Usdt, "w"),
            &schedule,
            t0(),
        )
        .unwrap();
        let mut resp = PaymentResponse::completed(&req, TransactionRef::new("tx").unwrap(), t0());
        resp.status = PaymentStatus::Processing;

        let err = LedgerEntry::record(&req, &resp).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn stats_filter_by_segment() {
        let mut log = PaymentLog::new(t0());
        log.append(entry(d("75"), Some("indigenous"), 1), t0()).unwrap();
        log.append(entry(d("25"), Some("indigenous"), 2), t0()).unwrap();
        log.append(entry(d("200"), Some("migrant_workers"), 3), t0()).unwrap();
        log.append(entry(d("10"), None, 4), t0()).unwrap();

        let s = log.stats(Some("Indigenous")).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.total_volume, d("100"));
        assert_eq!(s.average_transaction, d("50"));

        assert_eq!(log.stats(None).unwrap().count, 4);
        assert_eq!(log.unsegmented_stats().unwrap().count, 1);
        assert_eq!(
            log.recorded_segments().into_iter().collect::<Vec<_>>(),
            ["indigenous", "migrant_workers"]
        );
    }

    #[test]
    fn log_without_discount_field_still_loads() {
        let json = r#"{
            "payments": [{
                "payment_id": "0190f3b4-7f0e-7cc4-9d5e-1b2c3d4e5f60",
                "amount": 10.0,
                "currency": "USDT",
                "segment": null,
                "status": "completed",
                "transaction_ref": "abc",
                "fee": 0.01,
                "net_amount": 9.99,
                "created_at": "2025-03-01T12:00:00Z",
                "completed_at": "2025-03-01T12:00:02Z"
            }],
            "total_volume": 10.0,
            "total_fees": 0.01,
            "last_updated": "2025-03-01T12:00:02Z"
        }"#;

        let log: PaymentLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].discount_amount, Decimal::ZERO);
        assert_eq!(log.entries()[0].fee, d("0.01"));
        assert!(log.totals_consistent());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: totals always equal the sums over the entries, and the
        /// JSON form reloads to the same entries in the same order.
        #[test]
        fn totals_track_entries_through_reload(
            amounts in prop::collection::vec(100i64..5_000_000i64, 0..12)
        ) {
            let mut log = PaymentLog::new(t0());
            for (n, cents) in amounts.iter().enumerate() {
                log.append(entry(Decimal::new(*cents, 2), None, n), t0()).unwrap();
            }

            let json = serde_json::to_string(&log).unwrap();
            let reloaded: PaymentLog = serde_json::from_str(&json).unwrap();

            prop_assert_eq!(reloaded.entries(), log.entries());
            let volume: Decimal = amounts.iter().map(|c| Decimal::new(*c, 2)).sum();
            prop_assert_eq!(reloaded.total_volume(), volume);
            let fees: Decimal = reloaded.entries().iter().map(|e| e.fee).sum();
            prop_assert_eq!(reloaded.total_fees(), fees);
        }
    }
}
