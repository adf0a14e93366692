//! TypeScript static types for descriptors.

use crate::mapper::{quote, single_quote, TypeMapper};
use indexmap::IndexMap;
use schemagen_core::introspect;
use schemagen_core::{Descriptor, EnumValue, Metadata};

/// What the rendered type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// The value handed out by the generated accessors; template-backed
    /// function descriptors become callable.
    #[default]
    Accessor,
    /// The value as stored, before any accessor runs; functions are raw
    /// template strings.
    Raw,
}

#[derive(Debug, Clone)]
pub struct TypeScriptRenderer {
    pub field_name: String,
    pub target: Target,
}

impl TypeScriptRenderer {
    pub fn new(field_name: impl Into<String>) -> Self {
        TypeScriptRenderer {
            field_name: field_name.into(),
            target: Target::default(),
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    fn child(&self, field_name: &str) -> Self {
        TypeScriptRenderer {
            field_name: field_name.to_owned(),
            target: self.target,
        }
    }

    /// `[comment ]"name"[?]: type`. An optional descriptor puts the `?`
    /// marker on the name instead of widening the type.
    pub fn render_field(&self, d: &Descriptor) -> String {
        let comment = introspect::get_field_meta(d)
            .map(field_comment)
            .unwrap_or_default();
        let (marker, ty) = match introspect::unwrap_optional(d) {
            Some(inner) => ("?", self.resolve(inner)),
            None => ("", self.resolve(d)),
        };
        format!("{}{}{}: {}", comment, quote(&self.field_name), marker, ty)
    }
}

/// Doc comment placed before a field. A lone description stays on one
/// line; anything richer is written out as pretty JSON.
pub fn field_comment(meta: &Metadata) -> String {
    if meta.has_only_description() {
        let text = meta.description().unwrap_or_default();
        return format!("/** {} */ ", escape_comment(text));
    }
    let mut out = String::from("/**\n");
    for line in meta.to_pretty_json().lines() {
        out.push_str(" * ");
        out.push_str(&escape_comment(line));
        out.push('\n');
    }
    out.push_str(" */\n");
    out
}

pub(crate) fn escape_comment(text: &str) -> String {
    text.replace("*/", "*\\/")
}

/// Function types must be parenthesized before `|` binds to them.
fn operand(ty: String) -> String {
    if ty.starts_with("(...params") {
        format!("({})", ty)
    } else {
        ty
    }
}

impl TypeMapper for TypeScriptRenderer {
    fn any(&self) -> String {
        "any".to_owned()
    }

    fn array(&self, element: String) -> String {
        format!("Array<{}>", element)
    }

    fn boolean(&self) -> String {
        "boolean".to_owned()
    }

    fn enumeration(&self, values: &[EnumValue]) -> String {
        let values: Vec<String> = values
            .iter()
            .map(|v| match v {
                EnumValue::Str(s) => single_quote(s),
                EnumValue::Num(n) => n.to_string(),
            })
            .collect();
        values.join(" | ")
    }

    fn function(&self, args: &[Descriptor], returns: &Descriptor) -> String {
        match self.target {
            Target::Raw => "string | undefined".to_owned(),
            Target::Accessor => {
                let args: Vec<String> = args.iter().map(|a| self.resolve(a)).collect();
                format!(
                    "(...params: [{}]) => {}",
                    args.join(", "),
                    self.resolve(returns)
                )
            }
        }
    }

    fn null(&self) -> String {
        "null".to_owned()
    }

    fn nullable(&self, inner: String) -> String {
        format!("{} | null", operand(inner))
    }

    fn number(&self, _is_integer: bool) -> String {
        "number".to_owned()
    }

    fn object(&self, fields: &IndexMap<String, Descriptor>) -> String {
        if fields.is_empty() {
            return "{}".to_owned();
        }
        let fields: Vec<String> = fields
            .iter()
            .map(|(name, d)| self.child(name).render_field(d))
            .collect();
        format!("{{ {} }}", fields.join("; "))
    }

    fn optional(&self, inner: String) -> String {
        format!("{} | undefined", operand(inner))
    }

    fn record(&self, key: String, value: String) -> String {
        format!("Record<{}, {}>", key, value)
    }

    fn string(&self) -> String {
        "string".to_owned()
    }

    fn tuple(&self, items: &[Descriptor]) -> String {
        let items: Vec<String> = items.iter().map(|i| self.resolve(i)).collect();
        format!("[{}]", items.join(", "))
    }

    fn undefined(&self) -> String {
        "undefined".to_owned()
    }

    fn union(&self, options: Vec<String>) -> String {
        options
            .into_iter()
            .map(operand)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn unknown(&self) -> String {
        "unknown".to_owned()
    }
}
