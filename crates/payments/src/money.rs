//! Exact decimal arithmetic.
//!
//! `rust_decimal` silently rounds when a result needs more than 28 fractional
//! digits or 96 bits of mantissa, and panics on overflow with the plain
//! operators. These helpers return `None` in both cases, so money never
//! changes value behind the caller's back.

use rust_decimal::Decimal;

pub(crate) fn exact_add(a: Decimal, b: Decimal) -> Option<Decimal> {
    let (a, b) = (a.normalize(), b.normalize());
    if a.is_zero() {
        return Some(b);
    }
    if b.is_zero() {
        return Some(a);
    }
    let sum = a.checked_add(b)?;
    (sum.is_zero() || sum.scale() == a.scale().max(b.scale())).then_some(sum)
}

pub(crate) fn exact_sub(a: Decimal, b: Decimal) -> Option<Decimal> {
    exact_add(a, -b)
}

pub(crate) fn exact_mul(a: Decimal, b: Decimal) -> Option<Decimal> {
    let (a, b) = (a.normalize(), b.normalize());
    if a.is_zero() || b.is_zero() {
        return Some(Decimal::ZERO);
    }
    let scale = a.scale() + b.scale();
    let product = a.checked_mul(b)?;
    (product.scale() == scale).then_some(product)
}

/// `value / 100`, exact.
pub(crate) fn exact_percent(value: Decimal) -> Option<Decimal> {
    let mut out = value;
    out.set_scale(value.scale() + 2).ok()?;
    Some(out)
}

/// Sum of `values`, or `None` as soon as the running total cannot be held exactly.
pub(crate) fn exact_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, exact_add)
}
