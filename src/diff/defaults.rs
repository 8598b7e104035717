//! Default-value comparison.
//!
//! Conservative by construction: anything unknown or mismatched counts as a
//! difference. A false difference is safe; silently treating unknown kinds
//! as equal would hide real changes.

use crate::model::{DefaultValue, FieldDescriptor, Schema};

/// Compare the declared defaults of two fields.
///
/// Equal when neither field declares a default; unequal when exactly one
/// does, or when their value kinds differ. Enum defaults are compared by the
/// numeric tag of the named value, resolved through each side's enum type.
pub(crate) fn default_values_equal(
    old_schema: &Schema,
    old_field: &FieldDescriptor,
    new_schema: &Schema,
    new_field: &FieldDescriptor,
) -> bool {
    let (old_default, new_default) = match (&old_field.default, &new_field.default) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    if old_field.field_type.value_kind() != new_field.field_type.value_kind() {
        return false;
    }

    match (old_default, new_default) {
        (DefaultValue::Int(a), DefaultValue::Int(b)) => a == b,
        (DefaultValue::Uint(a), DefaultValue::Uint(b)) => a == b,
        // Bit equality keeps `nan` defaults reflexive; IEEE `==` would
        // report a schema as differing from an identical copy of itself.
        (DefaultValue::Float(a), DefaultValue::Float(b)) => a.to_bits() == b.to_bits(),
        (DefaultValue::Bool(a), DefaultValue::Bool(b)) => a == b,
        (DefaultValue::String(a), DefaultValue::String(b)) => a == b,
        (DefaultValue::Enum(a), DefaultValue::Enum(b)) => {
            enum_default_number(old_schema, old_field, a)
                .zip(enum_default_number(new_schema, new_field, b))
                .is_some_and(|(na, nb)| na == nb)
        }
        _ => false,
    }
}

/// Numeric tag of a named enum default, through the field's enum type.
fn enum_default_number(schema: &Schema, field: &FieldDescriptor, value_name: &str) -> Option<i32> {
    let enum_type = schema.enum_type(field.type_name.as_deref()?)?;
    enum_type.value_by_name(value_name).map(|v| v.number)
}
