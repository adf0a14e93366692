//! The renderer base shared by every output language.
//!
//! A renderer implements one hook per descriptor variant; [`TypeMapper::resolve`]
//! walks the descriptor and calls the hooks. Wrapper-like hooks (array,
//! record, union, optional, nullable) receive their children already
//! rendered. Structural hooks (object, tuple, function) receive the child
//! descriptors so a renderer can carry context such as a field name or a
//! property path down into them.

use indexmap::IndexMap;
use schemagen_core::introspect::{self, Shape};
use schemagen_core::{Descriptor, EnumValue};

pub trait TypeMapper {
    fn any(&self) -> String;
    fn array(&self, element: String) -> String;
    fn boolean(&self) -> String;
    fn enumeration(&self, values: &[EnumValue]) -> String;
    fn function(&self, args: &[Descriptor], returns: &Descriptor) -> String;
    fn null(&self) -> String;
    fn nullable(&self, inner: String) -> String;
    fn number(&self, is_integer: bool) -> String;
    fn object(&self, fields: &IndexMap<String, Descriptor>) -> String;
    fn optional(&self, inner: String) -> String;
    fn record(&self, key: String, value: String) -> String;
    fn string(&self) -> String;
    fn tuple(&self, items: &[Descriptor]) -> String;
    fn undefined(&self) -> String;
    fn union(&self, options: Vec<String>) -> String;
    fn unknown(&self) -> String;

    /// Post-process the rendering of one node. Identity by default.
    fn decorate(&self, _d: &Descriptor, rendered: String) -> String {
        rendered
    }

    /// Render a descriptor. Defaults render as their inner type; a variant
    /// this renderer does not know renders as `any`.
    fn resolve(&self, d: &Descriptor) -> String {
        let rendered = match introspect::shape(d) {
            Shape::Any => self.any(),
            Shape::Array(element) => self.array(self.resolve(element)),
            Shape::Boolean => self.boolean(),
            Shape::Default { inner, .. } => self.resolve(inner),
            Shape::Enum(values) => self.enumeration(values),
            Shape::Function { args, returns } => self.function(args, returns),
            Shape::Null => self.null(),
            Shape::Nullable(inner) => self.nullable(self.resolve(inner)),
            Shape::Number { is_integer } => self.number(is_integer),
            Shape::Object(fields) => self.object(fields),
            Shape::Optional(inner) => self.optional(self.resolve(inner)),
            Shape::Record { key, value } => self.record(self.resolve(key), self.resolve(value)),
            Shape::String => self.string(),
            Shape::Tuple(items) => self.tuple(items),
            Shape::Undefined => self.undefined(),
            Shape::Union(options) => {
                self.union(options.iter().map(|o| self.resolve(o)).collect())
            }
            Shape::Unknown => self.unknown(),
            _ => {
                tracing::warn!(
                    variant = d.variant_name(),
                    "unrecognized descriptor variant, rendering as any"
                );
                self.any()
            }
        };
        self.decorate(d, rendered)
    }
}

/// A JSON string literal for `s`, as used for field names in generated code.
pub fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// A single-quoted string literal for `s`. Control characters and the
/// line separators are escaped so the literal stays on one line.
pub fn single_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// True if `s` can be written as a bare object key.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
