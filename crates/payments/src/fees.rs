//! Fee schedule (per-currency base rates, per-segment discounts, amount limits).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paylane_core::{DomainError, DomainResult, ValueObject};

use crate::currency::Currency;
use crate::money::{exact_mul, exact_percent, exact_sub};

/// A named market segment and the discount it earns on the base fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentProfile {
    /// Fraction in `[0, 1]` taken off the base fee (0.5 = half price).
    pub discount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_currency: Option<Currency>,
}

impl SegmentProfile {
    pub fn new(discount: Decimal) -> Self {
        Self {
            discount,
            display_name: None,
            preferred_currency: None,
        }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn preferring(mut self, currency: Currency) -> Self {
        self.preferred_currency = Some(currency);
        self
    }
}

/// Static fee configuration.
///
/// Rates are percentages (`0.1` means 0.1% of the amount). Segment names are
/// matched case-insensitively; [`FeeSchedule::validated`] normalizes them to
/// lower case.
///
/// Missing tables fall back to the built-in defaults when deserializing, so a
/// config file may override only the parts it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub rates: BTreeMap<Currency, Decimal>,
    pub segments: BTreeMap<String, SegmentProfile>,
    /// Inclusive lower bound per currency.
    pub minimums: BTreeMap<Currency, Decimal>,
    /// Inclusive upper bound per currency. Absent means unbounded.
    pub maximums: BTreeMap<Currency, Decimal>,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let rates = BTreeMap::from([
            (Currency::Usdt, Decimal::new(1, 1)),
            (Currency::Usdc, Decimal::new(1, 1)),
            (Currency::Btc, Decimal::new(5, 1)),
            (Currency::Eth, Decimal::new(3, 1)),
            (Currency::Cad, Decimal::ONE),
            (Currency::Inr, Decimal::ONE),
        ]);

        let minimums = BTreeMap::from([
            (Currency::Usdt, Decimal::ONE),
            (Currency::Usdc, Decimal::ONE),
            (Currency::Btc, Decimal::TEN),
            (Currency::Eth, Decimal::new(5, 0)),
            (Currency::Cad, Decimal::new(150, 2)),
            (Currency::Inr, Decimal::new(80, 0)),
        ]);

        let maximums = BTreeMap::from([
            (Currency::Usdt, Decimal::new(50_000, 0)),
            (Currency::Usdc, Decimal::new(50_000, 0)),
            (Currency::Btc, Decimal::new(100_000, 0)),
            (Currency::Eth, Decimal::new(75_000, 0)),
        ]);

        let segments = BTreeMap::from([
            (
                "indigenous".to_string(),
                SegmentProfile::new(Decimal::new(5, 1))
                    .named("Indigenous communities")
                    .preferring(Currency::Usdt),
            ),
            (
                "remote_northern".to_string(),
                SegmentProfile::new(Decimal::new(3, 1))
                    .named("Remote northern communities")
                    .preferring(Currency::Cad),
            ),
            (
                "gig_workers".to_string(),
                SegmentProfile::new(Decimal::new(2, 1))
                    .named("Gig economy workers")
                    .preferring(Currency::Usdt),
            ),
            (
                "rural_farmers".to_string(),
                SegmentProfile::new(Decimal::new(7, 1))
                    .named("Rural farmers")
                    .preferring(Currency::Usdt),
            ),
            (
                "migrant_workers".to_string(),
                SegmentProfile::new(Decimal::new(8, 1))
                    .named("Migrant worker remittances")
                    .preferring(Currency::Usdt),
            ),
            (
                "micro_credit".to_string(),
                SegmentProfile::new(Decimal::new(6, 1))
                    .named("Micro-credit services")
                    .preferring(Currency::Usdt),
            ),
        ]);

        Self {
            rates,
            segments,
            minimums,
            maximums,
        }
    }
}

impl FeeSchedule {
    /// A schedule with no currencies and no segments (useful for building
    /// test fixtures from scratch).
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
            segments: BTreeMap::new(),
            minimums: BTreeMap::new(),
            maximums: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, currency: Currency, rate_percent: Decimal) -> Self {
        self.rates.insert(currency, rate_percent);
        self
    }

    pub fn with_segment(mut self, name: impl Into<String>, profile: SegmentProfile) -> Self {
        self.segments.insert(name.into(), profile);
        self
    }

    pub fn with_limits(
        mut self,
        currency: Currency,
        minimum: Option<Decimal>,
        maximum: Option<Decimal>,
    ) -> Self {
        match minimum {
            Some(min) => self.minimums.insert(currency, min),
            None => self.minimums.remove(&currency),
        };
        match maximum {
            Some(max) => self.maximums.insert(currency, max),
            None => self.maximums.remove(&currency),
        };
        self
    }

    /// Validate and normalize (segment names trimmed + lower-cased).
    ///
    /// Intended to run once at startup; every lookup afterwards assumes a
    /// validated schedule.
    pub fn validated(self) -> DomainResult<Self> {
        if self.rates.is_empty() {
            return Err(DomainError::invalid_input(
                "fee schedule must define at least one currency rate",
            ));
        }

        for (currency, rate) in &self.rates {
            if rate.is_sign_negative() || *rate > Decimal::ONE_HUNDRED {
                return Err(DomainError::invalid_input(format!(
                    "rate for {currency} must be within [0, 100] percent (got {rate})"
                )));
            }
        }

        for (currency, min) in &self.minimums {
            if min.is_sign_negative() {
                return Err(DomainError::invalid_input(format!(
                    "minimum for {currency} must not be negative (got {min})"
                )));
            }
        }

        for (currency, max) in &self.maximums {
            if max.is_sign_negative() {
                return Err(DomainError::invalid_input(format!(
                    "maximum for {currency} must not be negative (got {max})"
                )));
            }
            if let Some(min) = self.minimums.get(currency) {
                if min > max {
                    return Err(DomainError::invalid_input(format!(
                        "minimum for {currency} ({min}) exceeds maximum ({max})"
                    )));
                }
            }
        }

        let mut segments = BTreeMap::new();
        for (name, profile) in self.segments {
            let key = normalize_segment(&name);
            if key.is_empty() {
                return Err(DomainError::invalid_input("segment name must not be empty"));
            }
            if profile.discount.is_sign_negative() || profile.discount > Decimal::ONE {
                return Err(DomainError::invalid_input(format!(
                    "discount for segment '{key}' must be within [0, 1] (got {})",
                    profile.discount
                )));
            }
            if segments.insert(key.clone(), profile).is_some() {
                return Err(DomainError::invalid_input(format!(
                    "segment '{key}' is defined more than once"
                )));
            }
        }

        Ok(Self { segments, ..self })
    }

    pub fn supports(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    /// Base rate (percent) for a currency.
    pub fn rate(&self, currency: Currency) -> DomainResult<Decimal> {
        self.rates.get(&currency).copied().ok_or_else(|| {
            DomainError::invalid_input(format!("currency {currency} is not supported"))
        })
    }

    /// Look up a configured segment by name (case-insensitive). Returns the
    /// normalized name along with the profile.
    pub fn segment(&self, name: &str) -> Option<(&str, &SegmentProfile)> {
        self.segments
            .get_key_value(&normalize_segment(name))
            .map(|(k, p)| (k.as_str(), p))
    }

    /// Discount fraction for an optional segment. Segments without a profile
    /// pay the full base fee.
    pub fn discount(&self, segment: Option<&str>) -> Decimal {
        segment
            .and_then(|name| self.segment(name))
            .map_or(Decimal::ZERO, |(_, profile)| profile.discount)
    }

    /// Reject amounts that are non-positive or outside the currency's limits.
    pub fn check_amount(&self, amount: Decimal, currency: Currency) -> DomainResult<()> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "amount must be positive (got {amount})"
            )));
        }
        if let Some(min) = self.minimums.get(&currency) {
            if amount < *min {
                return Err(DomainError::invalid_input(format!(
                    "amount {amount} {currency} is below the minimum of {min}"
                )));
            }
        }
        if let Some(max) = self.maximums.get(&currency) {
            if amount > *max {
                return Err(DomainError::invalid_input(format!(
                    "amount {amount} {currency} exceeds the maximum of {max}"
                )));
            }
        }
        Ok(())
    }

    /// Quote the fee for an amount without creating a request.
    pub fn quote(
        &self,
        amount: Decimal,
        currency: Currency,
        segment: Option<&str>,
    ) -> DomainResult<FeeBreakdown> {
        let rate = self.rate(currency)?;
        self.check_amount(amount, currency)?;
        let discount = self.discount(segment);
        FeeBreakdown::compute(amount, rate, discount)
    }
}

/// Trimmed, lower-cased segment name; `None` for a blank one.
pub(crate) fn segment_key(name: &str) -> Option<String> {
    Some(normalize_segment(name)).filter(|key| !key.is_empty())
}

pub(crate) fn normalize_segment(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Fee computation result for one amount.
///
/// `fee = amount × rate/100 × (1 − discount)` and `net_amount = amount − fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub amount: Decimal,
    /// Base rate in percent, before discount.
    pub rate_percent: Decimal,
    pub discount: Decimal,
    /// Fee before the segment discount.
    pub base_fee: Decimal,
    /// Fee actually charged.
    pub fee: Decimal,
    /// `base_fee - fee`.
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
    /// Rate actually charged, in percent.
    pub effective_rate_percent: Decimal,
}

impl ValueObject for FeeBreakdown {}

impl FeeBreakdown {
    pub fn compute(amount: Decimal, rate_percent: Decimal, discount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::invalid_input("amount must be positive"));
        }
        if rate_percent.is_sign_negative() || rate_percent > Decimal::ONE_HUNDRED {
            return Err(DomainError::invalid_input("rate must be within [0, 100] percent"));
        }
        if discount.is_sign_negative() || discount > Decimal::ONE {
            return Err(DomainError::invalid_input("discount must be within [0, 1]"));
        }

        let inexact = || {
            DomainError::invalid_input(format!(
                "amount {amount} cannot be priced exactly within 28 decimal digits"
            ))
        };
        let keep = Decimal::ONE - discount;
        let base_fee = exact_mul(amount, rate_percent)
            .and_then(exact_percent)
            .ok_or_else(inexact)?;
        let fee = exact_mul(base_fee, keep).ok_or_else(inexact)?;
        let net_amount = exact_sub(amount, fee).ok_or_else(inexact)?;
        let discount_amount = exact_sub(base_fee, fee).ok_or_else(inexact)?;
        let effective_rate_percent = exact_mul(rate_percent, keep).ok_or_else(inexact)?;

        if fee.is_sign_negative() || fee > amount {
            return Err(DomainError::invariant(format!(
                "fee {fee} outside [0, {amount}]"
            )));
        }

        Ok(Self {
            amount: amount.normalize(),
            rate_percent: rate_percent.normalize(),
            discount: discount.normalize(),
            base_fee: base_fee.normalize(),
            fee: fee.normalize(),
            discount_amount: discount_amount.normalize(),
            net_amount: net_amount.normalize(),
            effective_rate_percent: effective_rate_percent.normalize(),
        })
    }
}
