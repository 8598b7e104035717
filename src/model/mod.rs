//! Normalized schema model.
//!
//! Immutable descriptors produced by the [`loader`](crate::loader), queried
//! read-only by the diff engine. Type references are fully-qualified-name
//! keys into the owning [`Schema`]'s registries rather than pointers, so
//! cyclic type graphs need no special ownership handling.

mod schema;

pub use schema::{
    DefaultValue, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldLabel, FieldType,
    MessageDescriptor, MethodDescriptor, Schema, ServiceDescriptor, ValueKind,
};
