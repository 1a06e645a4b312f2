//! Payment processing pipeline (application-level orchestration).
//!
//! ```text
//! PaymentDraft
//!   ↓
//! 1. Validate + quote against the fee schedule (pure, may reject)
//!   ↓
//! PaymentRequest (immutable, consumed by `process`)
//!   ↓
//! 2. Reject if expired (before touching the log)
//!   ↓
//! 3. Simulated processing delay
//!   ↓
//! 4. Synthesize transaction reference, build completed response
//!   ↓
//! 5. Append ledger entry to the store
//! ```
//!
//! No settlement happens and nothing is retried. Processing the same logical
//! payment twice yields two entries with two different references.

use std::collections::BTreeSet;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use paylane_core::{DomainError, PaymentId};
use paylane_payments::{
    Currency, FeeBreakdown, FeeSchedule, LedgerEntry, PaymentDraft, PaymentRequest,
    PaymentResponse, SegmentStats,
};

use crate::clock::Clock;
use crate::ledger_store::{LedgerStore, LedgerStoreError};
use crate::tx_ref::TransactionRefGenerator;

#[derive(Debug, Error)]
pub enum PaymentError {
    /// Rejected before any log mutation (invalid input, expiry, invariants).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Reading or writing the ledger failed.
    #[error(transparent)]
    Store(#[from] LedgerStoreError),
}

impl PaymentError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PaymentError::Domain(e) if e.is_invalid_input())
    }
}

/// Creates, processes and reports on payments.
///
/// - `S`: ledger backend
/// - `G`: transaction reference strategy
/// - `C`: clock
pub struct PaymentProcessor<S, G, C> {
    schedule: FeeSchedule,
    store: S,
    tx_refs: G,
    clock: C,
    processing_delay: Duration,
}

impl<S, G, C> PaymentProcessor<S, G, C>
where
    S: LedgerStore,
    G: TransactionRefGenerator,
    C: Clock,
{
    /// Validates the schedule up front; an invalid schedule never reaches
    /// request creation.
    pub fn new(schedule: FeeSchedule, store: S, tx_refs: G, clock: C) -> Result<Self, DomainError> {
        Ok(Self {
            schedule: schedule.validated()?,
            store,
            tx_refs,
            clock,
            processing_delay: Duration::ZERO,
        })
    }

    /// Artificial latency inserted into every `process` call.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_request(
        &self,
        amount: Decimal,
        currency: Currency,
        recipient: impl Into<String>,
        segment: Option<&str>,
    ) -> Result<PaymentRequest, DomainError> {
        let mut draft = PaymentDraft::new(amount, currency, recipient);
        if let Some(segment) = segment {
            draft = draft.segment(segment);
        }
        self.create_request_from(draft)
    }

    pub fn create_request_from(&self, draft: PaymentDraft) -> Result<PaymentRequest, DomainError> {
        let request = PaymentRequest::create(PaymentId::new(), draft, &self.schedule, self.clock.now())
            .inspect_err(|e| tracing::debug!(error = %e, "payment request rejected"))?;

        tracing::debug!(
            payment_id = %request.id_typed(),
            amount = %request.amount(),
            currency = %request.currency(),
            segment = request.segment().unwrap_or("-"),
            fee = %request.fees().fee,
            "payment request created"
        );
        Ok(request)
    }

    /// Quote without creating a request.
    pub fn quote(
        &self,
        amount: Decimal,
        currency: Currency,
        segment: Option<&str>,
    ) -> Result<FeeBreakdown, DomainError> {
        self.schedule.quote(amount, currency, segment)
    }

    pub fn process(&self, request: PaymentRequest) -> Result<PaymentResponse, PaymentError> {
        request.ensure_payable(self.clock.now())?;

        if !self.processing_delay.is_zero() {
            std::thread::sleep(self.processing_delay);
        }

        let completed_at = self.clock.now();
        let tx_ref = self.tx_refs.generate(&request, completed_at)?;
        let response = PaymentResponse::completed(&request, tx_ref, completed_at);
        let entry = LedgerEntry::record(&request, &response)?;

        match self.store.append(entry, completed_at) {
            Ok(()) => {}
            Err(LedgerStoreError::Rejected(e)) => {
                tracing::warn!(
                    payment_id = %request.id_typed(),
                    error = %e,
                    "ledger refused payment"
                );
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!(
                    payment_id = %request.id_typed(),
                    error = %e,
                    "failed to append payment to ledger"
                );
                return Err(e.into());
            }
        }

        tracing::info!(
            payment_id = %response.payment_id,
            amount = %request.amount(),
            currency = %request.currency(),
            segment = request.segment().unwrap_or("-"),
            fee = %response.fee,
            net_amount = %response.net_amount,
            "payment processed"
        );
        Ok(response)
    }

    /// Stats over the whole log, or one segment.
    pub fn get_segment_stats(&self, segment: Option<&str>) -> Result<SegmentStats, PaymentError> {
        let log = self.load_log()?;
        Ok(log.stats(segment)?)
    }

    /// Stats for every configured or recorded segment (name order), then the
    /// unsegmented bucket.
    pub fn segment_breakdown(&self) -> Result<Vec<SegmentStats>, PaymentError> {
        let log = self.load_log()?;
        let mut names: BTreeSet<&str> = self.schedule.segments.keys().map(String::as_str).collect();
        names.extend(log.recorded_segments());

        let mut out = names
            .into_iter()
            .map(|name| log.stats(Some(name)))
            .collect::<Result<Vec<_>, _>>()?;
        out.push(log.unsegmented_stats()?);
        Ok(out)
    }

    fn load_log(&self) -> Result<paylane_payments::PaymentLog, PaymentError> {
        self.store.load().map_err(|e| {
            tracing::error!(error = %e, "failed to load payment ledger");
            PaymentError::Store(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core::str::FromStr;

    use crate::clock::FixedClock;
    use crate::ledger_store::InMemoryLedgerStore;
    use crate::tx_ref::SequentialTransactionRefs;

    type TestProcessor = PaymentProcessor<InMemoryLedgerStore, SequentialTransactionRefs, FixedClock>;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn processor() -> TestProcessor {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        PaymentProcessor::new(
            FeeSchedule::default(),
            InMemoryLedgerStore::new(),
            SequentialTransactionRefs::new(),
            clock,
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_schedule() {
        let result = PaymentProcessor::new(
            FeeSchedule::empty(),
            InMemoryLedgerStore::new(),
            SequentialTransactionRefs::new(),
            FixedClock::new(Utc::now()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn process_completes_and_logs() {
        let p = processor();
        let req = p
            .create_request(d("75.0"), Currency::Usdt, "wallet-a", Some("indigenous"))
            .unwrap();
        let id = req.id_typed();

        let resp = p.process(req).unwrap();

        assert_eq!(resp.payment_id, id);
        assert_eq!(resp.status, paylane_payments::PaymentStatus::Completed);
        assert_eq!(resp.fee, d("0.0375"));
        assert_eq!(resp.net_amount, d("74.9625"));
        assert_eq!(resp.transaction_ref.as_ref().unwrap().as_str(), "tx-000001");

        let log = p.store().load().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].payment_id, id);
        assert_eq!(log.entries()[0].segment.as_deref(), Some("indigenous"));
    }

    #[test]
    fn invalid_input_never_reaches_the_log() {
        let p = processor();
        assert!(p.create_request(Decimal::ZERO, Currency::Usdt, "w", None).is_err());
        assert!(p.create_request(d("-1"), Currency::Usdt, "w", None).is_err());
        assert!(p.create_request(d("10"), Currency::Usdt, "  ", None).is_err());
        assert!(p.store().load().unwrap().is_empty());
    }

    #[test]
    fn unconfigured_segment_is_charged_full_fee_and_recorded() {
        let p = processor();
        let req = p
            .create_request(d("75"), Currency::Usdt, "w", Some("artisans"))
            .unwrap();
        let resp = p.process(req).unwrap();
        assert_eq!(resp.fee, d("0.075"));

        let log = p.store().load().unwrap();
        assert_eq!(log.entries()[0].segment.as_deref(), Some("artisans"));

        let breakdown = p.segment_breakdown().unwrap();
        let artisans = breakdown
            .iter()
            .find(|s| s.segment.as_deref() == Some("artisans"))
            .unwrap();
        assert_eq!(artisans.count, 1);
        assert_eq!(artisans.fee_savings, Decimal::ZERO);
    }

    #[test]
    fn ledger_overflow_is_an_error_and_the_store_stays_usable() {
        let p = processor();
        let huge = d("50000000000000000000000000000");

        let first = p.create_request(huge, Currency::Cad, "w", None).unwrap();
        p.process(first).unwrap();

        let second = p.create_request(huge, Currency::Cad, "w", None).unwrap();
        let err = p.process(second).unwrap_err();
        assert!(matches!(err, PaymentError::Domain(DomainError::InvariantViolation(_))));

        let small = p.create_request(d("10"), Currency::Cad, "w", None).unwrap();
        p.process(small).unwrap();

        let log = p.store().load().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.totals_consistent());
    }

    #[test]
    fn expired_request_is_rejected_without_logging() {
        let p = processor();

        // INR minimum is 80.
        assert!(p.create_request(d("20"), Currency::Inr, "acct", None).is_err());

        let req = p.create_request(d("100"), Currency::Inr, "acct", None).unwrap();
        p.clock.advance(chrono::Duration::minutes(61));

        let err = p.process(req).unwrap_err();
        assert!(matches!(err, PaymentError::Domain(DomainError::Expired(_))));
        assert!(p.store().load().unwrap().is_empty());
    }

    #[test]
    fn stats_reflect_processed_payments() {
        let p = processor();
        for (amount, segment) in [("75", "indigenous"), ("45", "rural_farmers"), ("25", "indigenous")] {
            let req = p.create_request(d(amount), Currency::Usdt, "w", Some(segment)).unwrap();
            p.process(req).unwrap();
        }

        let all = p.get_segment_stats(None).unwrap();
        assert_eq!(all.count, 3);
        assert_eq!(all.total_volume, d("145"));

        let indigenous = p.get_segment_stats(Some("indigenous")).unwrap();
        assert_eq!(indigenous.count, 2);
        assert_eq!(indigenous.total_fees, d("0.05"));
        assert_eq!(indigenous.average_transaction, d("50"));
        assert_eq!(indigenous.fee_savings, d("0.05"));

        let breakdown = p.segment_breakdown().unwrap();
        assert_eq!(breakdown.len(), p.schedule().segments.len() + 1);
        let farmers = breakdown
            .iter()
            .find(|s| s.segment.as_deref() == Some("rural_farmers"))
            .unwrap();
        assert_eq!(farmers.count, 1);
        assert!(breakdown.last().unwrap().segment.is_none());
    }
}
