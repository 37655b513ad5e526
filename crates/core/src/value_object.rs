//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values;
/// identity does not matter. `CatalogCode { "0002-1433-80" }` is a value
/// object, `Product { id: ProductId(..) }` is an entity.
///
/// To "modify" a value object, construct a new one. The bounds keep them
/// cheap to copy, comparable and debuggable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
