//! Introspection over descriptors.
//!
//! Renderers inspect descriptors only through this module: either through
//! [`shape`], a borrowed view of the variant and its payload, or through the
//! `is_*` / `get_*` pairs. The internal encoding in [`crate::descriptor`] can
//! change without touching any renderer.

use crate::descriptor::{Descriptor, EnumValue, Kind, Metadata};
use indexmap::IndexMap;
use serde_json::Value;

/// Borrowed view of one descriptor's variant.
///
/// Marked non-exhaustive: consumers must keep a fallback arm so variants
/// added later degrade instead of failing to compile.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum Shape<'a> {
    Any,
    Array(&'a Descriptor),
    Boolean,
    Default {
        inner: &'a Descriptor,
        value: &'a Value,
    },
    Enum(&'a [EnumValue]),
    Function {
        args: &'a [Descriptor],
        returns: &'a Descriptor,
    },
    Null,
    Nullable(&'a Descriptor),
    Number {
        is_integer: bool,
    },
    Object(&'a IndexMap<String, Descriptor>),
    Optional(&'a Descriptor),
    Record {
        key: &'a Descriptor,
        value: &'a Descriptor,
    },
    String,
    Tuple(&'a [Descriptor]),
    Undefined,
    Union(&'a [Descriptor]),
    Unknown,
}

pub fn shape(d: &Descriptor) -> Shape<'_> {
    match &d.kind {
        Kind::Any => Shape::Any,
        Kind::Array(element) => Shape::Array(element),
        Kind::Boolean => Shape::Boolean,
        Kind::Default { inner, value } => Shape::Default { inner, value },
        Kind::Enum(values) => Shape::Enum(values),
        Kind::Function { args, returns } => Shape::Function { args, returns },
        Kind::Null => Shape::Null,
        Kind::Nullable(inner) => Shape::Nullable(inner),
        Kind::Number { is_integer } => Shape::Number {
            is_integer: *is_integer,
        },
        Kind::Object(fields) => Shape::Object(fields),
        Kind::Optional(inner) => Shape::Optional(inner),
        Kind::Record { key, value } => Shape::Record { key, value },
        Kind::String => Shape::String,
        Kind::Tuple(items) => Shape::Tuple(items),
        Kind::Undefined => Shape::Undefined,
        Kind::Union(options) => Shape::Union(options),
        Kind::Unknown => Shape::Unknown,
    }
}

// ── Variant predicates ───────────────────────────────────────────────

pub fn is_string(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::String)
}

pub fn is_number(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Number { .. })
}

pub fn is_boolean(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Boolean)
}

pub fn is_null(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Null)
}

pub fn is_undefined(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Undefined)
}

pub fn is_any(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Any)
}

pub fn is_unknown(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Unknown)
}

pub fn is_array(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Array(_))
}

pub fn is_object(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Object(_))
}

pub fn is_tuple(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Tuple(_))
}

pub fn is_record(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Record { .. })
}

pub fn is_enum(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Enum(_))
}

pub fn is_union(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Union(_))
}

pub fn is_optional(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Optional(_))
}

pub fn is_nullable(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Nullable(_))
}

pub fn is_default(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Default { .. })
}

pub fn is_function(d: &Descriptor) -> bool {
    matches!(d.kind, Kind::Function { .. })
}

// ── Payload accessors ────────────────────────────────────────────────

/// Whether a number descriptor carries the integer constraint.
/// `None` for non-number descriptors.
pub fn is_number_integer(d: &Descriptor) -> Option<bool> {
    match d.kind {
        Kind::Number { is_integer } => Some(is_integer),
        _ => None,
    }
}

pub fn get_array_element(d: &Descriptor) -> Option<&Descriptor> {
    match &d.kind {
        Kind::Array(element) => Some(element.as_ref()),
        _ => None,
    }
}

pub fn get_object_shape(d: &Descriptor) -> Option<&IndexMap<String, Descriptor>> {
    match &d.kind {
        Kind::Object(fields) => Some(fields),
        _ => None,
    }
}

pub fn get_tuple_items(d: &Descriptor) -> Option<&[Descriptor]> {
    match &d.kind {
        Kind::Tuple(items) => Some(items.as_slice()),
        _ => None,
    }
}

/// `(key, value)` descriptors of a record.
pub fn get_record_types(d: &Descriptor) -> Option<(&Descriptor, &Descriptor)> {
    match &d.kind {
        Kind::Record { key, value } => Some((key.as_ref(), value.as_ref())),
        _ => None,
    }
}

pub fn get_enum_values(d: &Descriptor) -> Option<&[EnumValue]> {
    match &d.kind {
        Kind::Enum(values) => Some(values.as_slice()),
        _ => None,
    }
}

pub fn get_union_options(d: &Descriptor) -> Option<&[Descriptor]> {
    match &d.kind {
        Kind::Union(options) => Some(options.as_slice()),
        _ => None,
    }
}

pub fn unwrap_optional(d: &Descriptor) -> Option<&Descriptor> {
    match &d.kind {
        Kind::Optional(inner) => Some(inner.as_ref()),
        _ => None,
    }
}

pub fn unwrap_nullable(d: &Descriptor) -> Option<&Descriptor> {
    match &d.kind {
        Kind::Nullable(inner) => Some(inner.as_ref()),
        _ => None,
    }
}

/// `(inner, default value)` of a default-wrapped descriptor.
pub fn unwrap_default(d: &Descriptor) -> Option<(&Descriptor, &Value)> {
    match &d.kind {
        Kind::Default { inner, value } => Some((inner.as_ref(), value)),
        _ => None,
    }
}

/// `(args, returns)` of a function descriptor.
pub fn get_function_signature(d: &Descriptor) -> Option<(&[Descriptor], &Descriptor)> {
    match &d.kind {
        Kind::Function { args, returns } => Some((args.as_slice(), returns.as_ref())),
        _ => None,
    }
}

pub fn get_meta(d: &Descriptor) -> Option<&Metadata> {
    d.meta.as_ref().filter(|m| !m.is_empty())
}

/// Metadata of `d`, or of the descriptor an optional/default wrapper
/// encloses when the wrapper itself carries none.
pub fn get_field_meta(d: &Descriptor) -> Option<&Metadata> {
    get_meta(d).or_else(|| match &d.kind {
        Kind::Optional(inner) | Kind::Nullable(inner) => get_field_meta(inner),
        Kind::Default { inner, .. } => get_field_meta(inner),
        _ => None,
    })
}

/// True if a function descriptor appears anywhere inside `d`.
pub fn contains_function(d: &Descriptor) -> bool {
    match &d.kind {
        Kind::Function { .. } => true,
        Kind::Array(inner) | Kind::Optional(inner) | Kind::Nullable(inner) => {
            contains_function(inner)
        }
        Kind::Default { inner, .. } => contains_function(inner),
        Kind::Object(fields) => fields.values().any(contains_function),
        Kind::Tuple(items) | Kind::Union(items) => items.iter().any(contains_function),
        Kind::Record { value, .. } => contains_function(value),
        _ => false,
    }
}
