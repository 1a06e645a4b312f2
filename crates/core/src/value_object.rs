//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances with the same attributes are
/// the same value. In this workspace that covers currencies, fee quotes and
/// aggregated statistics, as opposed to payment requests which carry a
/// [`PaymentId`](crate::PaymentId).
///
/// Value objects are immutable. To "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
