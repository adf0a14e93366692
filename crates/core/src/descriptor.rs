//! The type-descriptor model.
//!
//! A [`Descriptor`] is the normalized, language-neutral description of one
//! value shape. Descriptors are built once (by the evaluator, the JSON
//! inference mapper, or the constructors below) and are read-only afterward.
//! Metadata attached with `.meta({...})` travels with the node it annotates,
//! so two independent evaluations can never observe each other's annotations.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// Errors raised when a constructor is given arguments it cannot accept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("enum requires at least one value")]
    EmptyEnum,
    #[error("union requires at least one option")]
    EmptyUnion,
    #[error("record key must be a string, number or enum schema, got {0}")]
    InvalidRecordKey(&'static str),
}

/// One value of an enum descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Str(String),
    Num(serde_json::Number),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Str(s) => write!(f, "{}", s),
            EnumValue::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for EnumValue {
    fn from(s: &str) -> Self {
        EnumValue::Str(s.to_owned())
    }
}

impl From<i64> for EnumValue {
    fn from(n: i64) -> Self {
        EnumValue::Num(n.into())
    }
}

/// Free-form annotations attached to a descriptor via `.meta({...})`.
///
/// Key order is the order the author wrote them in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new(entries: Map<String, Value>) -> Self {
        Metadata(entries)
    }

    /// The `description` annotation, when it is a string.
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    /// True when `description` is the only annotation present.
    pub fn has_only_description(&self) -> bool {
        self.0.len() == 1 && self.description().is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: Metadata) {
        for (k, v) in other.0 {
            self.0.insert(k, v);
        }
    }

    /// Two-space indented JSON of all annotations, in authoring order.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_owned())
    }
}

/// Internal variant encoding. Renderers never see this type; they go
/// through [`crate::introspect`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Kind {
    String,
    Number {
        is_integer: bool,
    },
    Boolean,
    Null,
    Undefined,
    Any,
    Unknown,
    Array(Box<Descriptor>),
    Object(IndexMap<String, Descriptor>),
    Tuple(Vec<Descriptor>),
    Record {
        key: Box<Descriptor>,
        value: Box<Descriptor>,
    },
    Enum(Vec<EnumValue>),
    Union(Vec<Descriptor>),
    Optional(Box<Descriptor>),
    Nullable(Box<Descriptor>),
    Default {
        inner: Box<Descriptor>,
        value: Value,
    },
    Function {
        args: Vec<Descriptor>,
        returns: Box<Descriptor>,
    },
}

/// An immutable, variant-tagged type descriptor.
///
/// Equality is structural. Object fields compare as a map, so two objects
/// with the same fields in a different order are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub(crate) kind: Kind,
    pub(crate) meta: Option<Metadata>,
}

impl Descriptor {
    fn from_kind(kind: Kind) -> Self {
        Descriptor { kind, meta: None }
    }

    pub fn string() -> Self {
        Self::from_kind(Kind::String)
    }

    pub fn number() -> Self {
        Self::from_kind(Kind::Number { is_integer: false })
    }

    pub fn integer() -> Self {
        Self::from_kind(Kind::Number { is_integer: true })
    }

    pub fn boolean() -> Self {
        Self::from_kind(Kind::Boolean)
    }

    pub fn null() -> Self {
        Self::from_kind(Kind::Null)
    }

    pub fn undefined() -> Self {
        Self::from_kind(Kind::Undefined)
    }

    pub fn any() -> Self {
        Self::from_kind(Kind::Any)
    }

    pub fn unknown() -> Self {
        Self::from_kind(Kind::Unknown)
    }

    pub fn array(element: Descriptor) -> Self {
        Self::from_kind(Kind::Array(Box::new(element)))
    }

    /// Build an object descriptor. A repeated name keeps its first position
    /// and takes the last descriptor given for it.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Descriptor)>,
    {
        let fields = fields.into_iter().map(|(k, d)| (k.into(), d)).collect();
        Self::from_kind(Kind::Object(fields))
    }

    pub fn tuple(items: Vec<Descriptor>) -> Self {
        Self::from_kind(Kind::Tuple(items))
    }

    pub fn record(key: Descriptor, value: Descriptor) -> Result<Self, DescriptorError> {
        if !key.is_primitive_like() {
            return Err(DescriptorError::InvalidRecordKey(key.variant_name()));
        }
        Ok(Self::from_kind(Kind::Record {
            key: Box::new(key),
            value: Box::new(value),
        }))
    }

    pub fn enumeration(values: Vec<EnumValue>) -> Result<Self, DescriptorError> {
        if values.is_empty() {
            return Err(DescriptorError::EmptyEnum);
        }
        Ok(Self::from_kind(Kind::Enum(values)))
    }

    pub fn union(options: Vec<Descriptor>) -> Result<Self, DescriptorError> {
        if options.is_empty() {
            return Err(DescriptorError::EmptyUnion);
        }
        Ok(Self::from_kind(Kind::Union(options)))
    }

    pub fn optional(inner: Descriptor) -> Self {
        Self::from_kind(Kind::Optional(Box::new(inner)))
    }

    pub fn nullable(inner: Descriptor) -> Self {
        Self::from_kind(Kind::Nullable(Box::new(inner)))
    }

    pub fn with_default(inner: Descriptor, value: Value) -> Self {
        Self::from_kind(Kind::Default {
            inner: Box::new(inner),
            value,
        })
    }

    pub fn function(args: Vec<Descriptor>, returns: Descriptor) -> Self {
        Self::from_kind(Kind::Function {
            args,
            returns: Box::new(returns),
        })
    }

    /// Attach metadata. Annotations already present are kept unless `meta`
    /// overrides them.
    pub fn with_meta(mut self, meta: Metadata) -> Self {
        match self.meta.as_mut() {
            Some(existing) => existing.merge(meta),
            None => self.meta = Some(meta),
        }
        self
    }

    /// Lower-case name of the variant, as used in diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match &self.kind {
            Kind::String => "string",
            Kind::Number { .. } => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Any => "any",
            Kind::Unknown => "unknown",
            Kind::Array(_) => "array",
            Kind::Object(_) => "object",
            Kind::Tuple(_) => "tuple",
            Kind::Record { .. } => "record",
            Kind::Enum(_) => "enum",
            Kind::Union(_) => "union",
            Kind::Optional(_) => "optional",
            Kind::Nullable(_) => "nullable",
            Kind::Default { .. } => "default",
            Kind::Function { .. } => "function",
        }
    }

    /// Record keys may only be strings, numbers, enums, or wrappers and
    /// unions built from those.
    fn is_primitive_like(&self) -> bool {
        match &self.kind {
            Kind::String | Kind::Number { .. } | Kind::Enum(_) => true,
            Kind::Union(options) => options.iter().all(Descriptor::is_primitive_like),
            Kind::Optional(inner) | Kind::Nullable(inner) => inner.is_primitive_like(),
            Kind::Default { inner, .. } => inner.is_primitive_like(),
            _ => false,
        }
    }
}
