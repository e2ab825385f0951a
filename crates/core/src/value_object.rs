//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity**: they are defined
//! entirely by their attribute values. A currency label, a palette colour, or a
//! single payer contribution are value objects; an event or a participant is an
//! entity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Contribution {
///     participant_id: ParticipantId,
///     amount: f64,
/// }
///
/// impl ValueObject for Contribution {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
