use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use paylane_core::{DomainError, DomainResult, PaymentId};

use crate::currency::Currency;
use crate::fees::{FeeBreakdown, FeeSchedule, segment_key};

/// Caller input for a new payment request (not yet validated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub amount: Decimal,
    pub currency: Currency,
    pub recipient: String,
    pub segment: Option<String>,
    pub memo: Option<String>,
}

impl PaymentDraft {
    pub fn new(amount: Decimal, currency: Currency, recipient: impl Into<String>) -> Self {
        Self {
            amount,
            currency,
            recipient: recipient.into(),
            segment: None,
            memo: None,
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A validated, immutable payment request.
///
/// Only constructible through [`PaymentRequest::create`], which quotes the fee
/// against a validated [`FeeSchedule`]. The quote travels with the request so
/// processing does not depend on the schedule still being the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    id: PaymentId,
    amount: Decimal,
    currency: Currency,
    recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    fees: FeeBreakdown,
}

impl PaymentRequest {
    pub fn create(
        id: PaymentId,
        draft: PaymentDraft,
        schedule: &FeeSchedule,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let PaymentDraft {
            amount,
            currency,
            recipient,
            segment,
            memo,
        } = draft;

        let recipient = recipient.trim().to_string();
        if recipient.is_empty() {
            return Err(DomainError::invalid_input("recipient address must not be empty"));
        }

        let segment = segment.as_deref().and_then(segment_key);

        let fees = schedule.quote(amount, currency, segment.as_deref())?;
        let memo = memo.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());

        Ok(Self {
            id,
            amount: fees.amount,
            currency,
            recipient,
            memo,
            segment,
            created_at,
            expires_at: created_at + currency.request_ttl(),
            fees,
        })
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Normalized (lower-case) segment name, if any.
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Fee quote computed at creation.
    pub fn fees(&self) -> &FeeBreakdown {
        &self.fees
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Fails with [`DomainError::Expired`] once the request is no longer payable.
    pub fn ensure_payable(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_expired_at(now) {
            return Err(DomainError::expired(format!(
                "payment {} expired at {}",
                self.id,
                self.expires_at.to_rfc3339()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn schedule() -> FeeSchedule {
        FeeSchedule::default().validated().unwrap()
    }

    #[test]
    fn create_quotes_fee_and_keeps_inputs() {
        let draft = PaymentDraft::new(d("75.0"), Currency::Usdt, "wallet-1")
            .segment("Indigenous")
            .memo("beadwork");
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap();

        assert_eq!(req.amount(), d("75"));
        assert_eq!(req.segment(), Some("indigenous"));
        assert_eq!(req.memo(), Some("beadwork"));
        assert_eq!(req.fees().fee, d("0.0375"));
        assert_eq!(req.expires_at(), t0() + Duration::hours(24));
    }

    #[test]
    fn fiat_requests_expire_after_an_hour() {
        let draft = PaymentDraft::new(d("20"), Currency::Cad, "acct-9");
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap();

        assert!(!req.is_expired_at(t0() + Duration::minutes(59)));
        assert!(req.is_expired_at(t0() + Duration::hours(1)));
        let err = req.ensure_payable(t0() + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, DomainError::Expired(_)));
    }

    #[test]
    fn blank_recipient_is_rejected() {
        let draft = PaymentDraft::new(d("10"), Currency::Usdt, "  ");
        let err = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn zero_amount_is_rejected_before_anything_else_is_built() {
        let draft = PaymentDraft::new(Decimal::ZERO, Currency::Usdt, "wallet");
        let err = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn unconfigured_segment_is_kept_without_discount() {
        let draft = PaymentDraft::new(d("75"), Currency::Usdt, "wallet").segment(" Artisans ");
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap();
        assert_eq!(req.segment(), Some("artisans"));
        assert_eq!(req.fees().fee, d("0.075"));
    }

    #[test]
    fn blank_segment_means_none() {
        let draft = PaymentDraft::new(d("10"), Currency::Usdt, "wallet").segment("  ");
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap();
        assert_eq!(req.segment(), None);
    }

    #[test]
    fn blank_memo_is_dropped() {
        let draft = PaymentDraft::new(d("10"), Currency::Usdt, "wallet").memo("   ");
        let req = PaymentRequest::create(PaymentId::new(), draft, &schedule(), t0()).unwrap();
        assert_eq!(req.memo(), None);
    }
}
