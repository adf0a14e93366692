//! Runtime accessor expressions.
//!
//! Given the raw value of a config entry, the generated expression pulls
//! out each leaf by property path and turns template-backed function
//! descriptors into callables.

use crate::mapper::{quote, single_quote, TypeMapper};
use crate::typescript::escape_comment;
use indexmap::IndexMap;
use schemagen_core::introspect;
use schemagen_core::{Descriptor, EnumValue};

pub const DEFAULT_ROOT: &str = "raw";
pub const DEFAULT_TEMPLATE_FN: &str = "Mustache.render";

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

#[derive(Debug, Clone)]
pub struct AccessorRenderer {
    pub field_name: String,
    pub path: Vec<PathSegment>,
    /// Identifier holding the raw value.
    pub root: String,
    /// Function called as `template_fn(template, params)`.
    pub template_fn: String,
}

impl AccessorRenderer {
    pub fn new(field_name: impl Into<String>) -> Self {
        AccessorRenderer {
            field_name: field_name.into(),
            path: Vec::new(),
            root: DEFAULT_ROOT.to_owned(),
            template_fn: DEFAULT_TEMPLATE_FN.to_owned(),
        }
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    fn child(&self, field_name: &str, segment: PathSegment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        AccessorRenderer {
            field_name: field_name.to_owned(),
            path,
            root: self.root.clone(),
            template_fn: self.template_fn.clone(),
        }
    }

    /// `[/** description */ ]"name": expr`.
    pub fn render_field(&self, d: &Descriptor) -> String {
        format!(
            "{}{}: {}",
            description_comment(d),
            quote(&self.field_name),
            self.resolve(d)
        )
    }

    /// `root`, or `root?.['a']?.[0]!` once a path is present.
    pub fn access(&self) -> String {
        if self.path.is_empty() {
            return self.root.clone();
        }
        let mut out = self.root.clone();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    out.push_str("?.[");
                    out.push_str(&single_quote(key));
                    out.push(']');
                }
                PathSegment::Index(i) => {
                    out.push_str(&format!("?.[{}]", i));
                }
            }
        }
        out.push('!');
        out
    }
}

/// `/** text */ ` when the descriptor carries a description, else empty.
/// Other annotations are not rendered next to accessors.
pub fn description_comment(d: &Descriptor) -> String {
    introspect::get_field_meta(d)
        .and_then(|m| m.description())
        .map(|text| format!("/** {} */ ", escape_comment(text)))
        .unwrap_or_default()
}

impl TypeMapper for AccessorRenderer {
    fn any(&self) -> String {
        self.access()
    }

    fn array(&self, _element: String) -> String {
        self.access()
    }

    fn boolean(&self) -> String {
        self.access()
    }

    fn enumeration(&self, _values: &[EnumValue]) -> String {
        self.access()
    }

    fn function(&self, _args: &[Descriptor], _returns: &Descriptor) -> String {
        format!(
            "(params) => {}({} ?? \"\", params)",
            self.template_fn,
            self.access()
        )
    }

    fn null(&self) -> String {
        self.access()
    }

    fn nullable(&self, inner: String) -> String {
        inner
    }

    fn number(&self, _is_integer: bool) -> String {
        self.access()
    }

    fn object(&self, fields: &IndexMap<String, Descriptor>) -> String {
        if fields.is_empty() {
            return self.access();
        }
        let fields: Vec<String> = fields
            .iter()
            .map(|(name, d)| {
                self.child(name, PathSegment::Key(name.clone()))
                    .render_field(d)
            })
            .collect();
        format!("{{ {} }}", fields.join(", "))
    }

    fn optional(&self, inner: String) -> String {
        inner
    }

    fn record(&self, _key: String, _value: String) -> String {
        self.access()
    }

    fn string(&self) -> String {
        self.access()
    }

    fn tuple(&self, items: &[Descriptor]) -> String {
        let items: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, d)| self.child(&self.field_name, PathSegment::Index(i)).resolve(d))
            .collect();
        format!("[{}]", items.join(", "))
    }

    fn undefined(&self) -> String {
        self.access()
    }

    fn union(&self, _options: Vec<String>) -> String {
        self.access()
    }

    fn unknown(&self) -> String {
        self.access()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagen_core::{evaluate, EvaluateOptions};

    const PATH: [&str; 3] = ["first", "second", "third"];

    fn schema(src: &str) -> Descriptor {
        evaluate(src, &EvaluateOptions::default()).expect("evaluates")
    }

    fn field(src: &str) -> String {
        AccessorRenderer::new("someKey").render_field(&schema(src))
    }

    fn field_at_path(src: &str) -> String {
        AccessorRenderer::new("someKey")
            .with_path(PATH)
            .render_field(&schema(src))
    }

    #[test]
    fn leaves_read_the_root() {
        for src in [
            "z.string()",
            "z.number()",
            "z.number().int()",
            "z.boolean()",
            "z.any()",
            "z.array(z.string())",
            "z.string().array()",
            r#"z.enum(["first", "second"])"#,
            "z.null()",
            "z.undefined()",
            "z.unknown()",
            "z.union([z.string(), z.number()])",
            "z.string().or(z.number())",
            "z.record(z.string(), z.number())",
            "z.optional(z.string())",
            "z.string().optional()",
        ] {
            assert_eq!(field(src), "\"someKey\": raw", "for {}", src);
            assert_eq!(
                field_at_path(src),
                "\"someKey\": raw?.['first']?.['second']?.['third']!",
                "for {}",
                src
            );
        }
    }

    #[test]
    fn tuples_index_each_item() {
        assert_eq!(
            field("z.tuple([z.string(), z.number()])"),
            "\"someKey\": [raw?.[0]!, raw?.[1]!]"
        );
        assert_eq!(
            field_at_path("z.tuple([z.string(), z.number()])"),
            "\"someKey\": [raw?.['first']?.['second']?.['third']?.[0]!, raw?.['first']?.['second']?.['third']?.[1]!]"
        );
    }

    #[test]
    fn objects_read_each_field() {
        assert_eq!(
            field("z.object({ name: z.string(), age: z.number() })"),
            "\"someKey\": { \"name\": raw?.['name']!, \"age\": raw?.['age']! }"
        );
        assert_eq!(
            field_at_path("z.object({ name: z.string(), age: z.number() })"),
            "\"someKey\": { \"name\": raw?.['first']?.['second']?.['third']?.['name']!, \"age\": raw?.['first']?.['second']?.['third']?.['age']! }"
        );
    }

    #[test]
    fn functions_render_templates() {
        let src = "z.function({input: z.tuple([z.string(), z.number()]), output: z.boolean()})";
        assert_eq!(
            field(src),
            "\"someKey\": (params) => Mustache.render(raw ?? \"\", params)"
        );
        assert_eq!(
            field_at_path(src),
            "\"someKey\": (params) => Mustache.render(raw?.['first']?.['second']?.['third']! ?? \"\", params)"
        );
    }

    #[test]
    fn complex_combination() {
        let src = r#"
          z.object({
            name: z.string(),
            age: z.number().int(),
            topLevel: z.function({input: z.tuple([z.boolean().optional(), z.any()]), output: z.string()}),
            more: z.object({
              details: z.string(),
              count: z.number().int(),
              exec: z.function({input: z.tuple([z.string()]), output: z.boolean().optional()}),
            }),
            tags: z.array(z.string()).optional(),
            isActive: z.boolean().default(true),
          })
        "#;
        assert_eq!(
            field(src),
            "\"someKey\": { \"name\": raw?.['name']!, \"age\": raw?.['age']!, \"topLevel\": (params) => Mustache.render(raw?.['topLevel']! ?? \"\", params), \"more\": { \"details\": raw?.['more']?.['details']!, \"count\": raw?.['more']?.['count']!, \"exec\": (params) => Mustache.render(raw?.['more']?.['exec']! ?? \"\", params) }, \"tags\": raw?.['tags']!, \"isActive\": raw?.['isActive']! }"
        );
    }

    #[test]
    fn only_descriptions_are_commented() {
        assert_eq!(
            AccessorRenderer::new("email")
                .render_field(&schema(r#"z.string().meta({ description: "User's email address" })"#)),
            "/** User's email address */ \"email\": raw"
        );
        assert_eq!(
            AccessorRenderer::new("nickname").render_field(&schema(
                r#"z.string().optional().meta({ description: "Optional user nickname" })"#
            )),
            "/** Optional user nickname */ \"nickname\": raw"
        );
        assert_eq!(
            field(r#"z.string().meta({ id: "some-id", title: "Some Title" })"#),
            "\"someKey\": raw"
        );
    }

    #[test]
    fn nested_descriptions_follow_the_path() {
        let src = r#"
          z.object({
            userId: z.string().meta({ description: "Unique user identifier" }),
            settings: z.object({
              theme: z.enum(["light", "dark"]).meta({ description: "UI theme preference" }),
              notifications: z.boolean().meta({ description: "Enable notifications" })
            }),
            metadata: z.record(z.string(), z.any()).optional()
          })
        "#;
        let rendered = AccessorRenderer::new("response")
            .with_path(["userData"])
            .render_field(&schema(src));
        assert_eq!(
            rendered,
            "\"response\": { /** Unique user identifier */ \"userId\": raw?.['userData']?.['userId']!, \"settings\": { /** UI theme preference */ \"theme\": raw?.['userData']?.['settings']?.['theme']!, /** Enable notifications */ \"notifications\": raw?.['userData']?.['settings']?.['notifications']! }, \"metadata\": raw?.['userData']?.['metadata']! }"
        );
    }

    #[test]
    fn custom_root_and_template_fn() {
        let mut r = AccessorRenderer::new("k");
        r.root = "value".into();
        r.template_fn = "render".into();
        let d = schema("z.function()");
        assert_eq!(r.resolve(&d), "(params) => render(value ?? \"\", params)");
    }
}
