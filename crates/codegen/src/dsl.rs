//! Canonical schema DSL text for a descriptor.
//!
//! The output evaluates back to an equal descriptor, except that defaults
//! are dropped (they render as their inner type).

use crate::mapper::{is_identifier, quote, single_quote, TypeMapper};
use indexmap::IndexMap;
use schemagen_core::introspect;
use schemagen_core::{Descriptor, EnumValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct DslRenderer;

impl DslRenderer {
    pub fn new() -> Self {
        DslRenderer
    }

    /// `name: <dsl>`, as written inside an object literal.
    pub fn render_field(&self, name: &str, d: &Descriptor) -> String {
        format!("{}: {}", object_key(name), self.resolve(d))
    }
}

fn object_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_owned()
    } else {
        quote(name)
    }
}

impl TypeMapper for DslRenderer {
    fn any(&self) -> String {
        "z.any()".to_owned()
    }

    fn array(&self, element: String) -> String {
        format!("z.array({})", element)
    }

    fn boolean(&self) -> String {
        "z.boolean()".to_owned()
    }

    fn enumeration(&self, values: &[EnumValue]) -> String {
        let values: Vec<String> = values
            .iter()
            .map(|v| match v {
                EnumValue::Str(s) => single_quote(s),
                EnumValue::Num(n) => n.to_string(),
            })
            .collect();
        format!("z.enum([{}])", values.join(","))
    }

    fn function(&self, args: &[Descriptor], returns: &Descriptor) -> String {
        let args: Vec<String> = args.iter().map(|a| self.resolve(a)).collect();
        format!(
            "z.function({{input: z.tuple([{}]), output: {}}})",
            args.join(", "),
            self.resolve(returns)
        )
    }

    fn null(&self) -> String {
        "z.null()".to_owned()
    }

    fn nullable(&self, inner: String) -> String {
        format!("{}.nullable()", inner)
    }

    fn number(&self, is_integer: bool) -> String {
        if is_integer {
            "z.number().int()".to_owned()
        } else {
            "z.number()".to_owned()
        }
    }

    fn object(&self, fields: &IndexMap<String, Descriptor>) -> String {
        let fields: Vec<String> = fields
            .iter()
            .map(|(name, d)| self.render_field(name, d))
            .collect();
        format!("z.object({{{}}})", fields.join("; "))
    }

    fn optional(&self, inner: String) -> String {
        format!("{}.optional()", inner)
    }

    fn record(&self, key: String, value: String) -> String {
        format!("z.record({}, {})", key, value)
    }

    fn string(&self) -> String {
        "z.string()".to_owned()
    }

    fn tuple(&self, items: &[Descriptor]) -> String {
        let items: Vec<String> = items.iter().map(|i| self.resolve(i)).collect();
        format!("z.tuple([{}])", items.join(", "))
    }

    fn undefined(&self) -> String {
        "z.undefined()".to_owned()
    }

    fn union(&self, options: Vec<String>) -> String {
        format!("z.union([{}])", options.join(", "))
    }

    fn unknown(&self) -> String {
        "z.unknown()".to_owned()
    }

    /// Re-emit metadata so it survives a round trip.
    fn decorate(&self, d: &Descriptor, rendered: String) -> String {
        match introspect::get_meta(d) {
            Some(meta) => format!(
                "{}.meta({})",
                rendered,
                serde_json::Value::Object(meta.as_map().clone())
            ),
            None => rendered,
        }
    }
}
