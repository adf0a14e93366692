//! Descriptor inference from sample JSON values.

use crate::descriptor::Descriptor;
use serde_json::Value;

/// Infer a descriptor from one JSON value. Total: every value maps to a
/// descriptor.
///
/// Numbers infer as non-integer. An array's element is the common
/// descriptor of its members when they all agree, `unknown` otherwise
/// (including for the empty array).
pub fn infer(value: &Value) -> Descriptor {
    match value {
        Value::Null => Descriptor::null(),
        Value::Bool(_) => Descriptor::boolean(),
        Value::Number(_) => Descriptor::number(),
        Value::String(_) => Descriptor::string(),
        Value::Array(items) => Descriptor::array(unify(items)),
        Value::Object(map) => Descriptor::object(map.iter().map(|(k, v)| (k.as_str(), infer(v)))),
    }
}

fn unify(items: &[Value]) -> Descriptor {
    let mut inferred = items.iter().map(infer);
    let Some(first) = inferred.next() else {
        return Descriptor::unknown();
    };
    for other in inferred {
        if other != first {
            tracing::debug!(
                expected = first.variant_name(),
                found = other.variant_name(),
                "heterogeneous array, element inferred as unknown"
            );
            return Descriptor::unknown();
        }
    }
    first
}
