//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Quantities, counter keys and reservation requests are all value objects:
/// two instances holding the same values are interchangeable, and none of
/// them change after construction. Construction is where validation happens,
/// so holding a value object means holding a valid one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
