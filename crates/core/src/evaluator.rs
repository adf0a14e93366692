//! Secure evaluation of schema DSL text.
//!
//! Text is lexed and parsed into an [`Expr`] tree, then walked once to
//! enforce the whitelist and the node-count ceiling. Only a tree that passes
//! the walk is built into a [`Descriptor`]. Nothing in the text is ever
//! executed: refinement callbacks are checked for safety and then dropped.

use crate::ast::{Expr, ExprKind, UnaryOp};
use crate::descriptor::{Descriptor, DescriptorError, EnumValue, Kind, Metadata};
use crate::error::EvalError;
use crate::{lexer, parser};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub const DEFAULT_MAX_NODES: usize = 5_000;
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Resource ceilings applied while evaluating one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Maximum number of syntax nodes in the expression tree.
    pub max_nodes: usize,
    /// Maximum expression nesting depth.
    pub max_depth: usize,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        EvaluateOptions {
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Evaluate DSL text into a descriptor.
///
/// Pure function of `(text, options)`: two calls with equal input produce
/// equal descriptors, and no state is shared between calls.
pub fn evaluate(text: &str, options: &EvaluateOptions) -> Result<Descriptor, EvalError> {
    let tokens = lexer::lex(text)?;
    let expr = parser::parse(&tokens, options.max_depth)?;

    let mut guard = Guard {
        nodes: 0,
        max_nodes: options.max_nodes,
    };
    guard.check_schema(&expr)?;
    tracing::debug!(nodes = guard.nodes, "schema text passed validation");

    match build(&expr)? {
        Val::Schema(d) => Ok(d),
        other => Err(EvalError::syntax(
            expr.line,
            format!("expression evaluates to {}, not a schema", other.describe()),
        )),
    }
}

// ──────────────────────────────────────────────
// Whitelists
// ──────────────────────────────────────────────

/// Members reachable directly on `z`.
const FACTORIES: &[&str] = &[
    "string",
    "number",
    "int",
    "int32",
    "uint32",
    "safeint",
    "float32",
    "float64",
    "boolean",
    "null",
    "undefined",
    "any",
    "unknown",
    "array",
    "object",
    "strictObject",
    "looseObject",
    "tuple",
    "record",
    "enum",
    "literal",
    "union",
    "discriminatedUnion",
    "optional",
    "nullable",
    "nullish",
    "function",
    "email",
    "uuid",
    "url",
    "cuid",
    "cuid2",
    "ulid",
    "nanoid",
    "ipv4",
    "ipv6",
    "base64",
];

/// Factories that produce a plain string schema.
const STRING_FACTORIES: &[&str] = &[
    "string", "email", "uuid", "url", "cuid", "cuid2", "ulid", "nanoid", "ipv4", "ipv6", "base64",
];

const WRAPPER_METHODS: &[&str] = &[
    "optional",
    "nullable",
    "nullish",
    "default",
    "prefault",
    "catch",
    "array",
    "or",
    "describe",
    "meta",
    "refine",
    "superRefine",
    "check",
    "readonly",
    "brand",
];

const NUMBER_CHECKS: &[&str] = &[
    "int",
    "positive",
    "negative",
    "nonnegative",
    "nonpositive",
    "gt",
    "gte",
    "lt",
    "lte",
    "multipleOf",
    "step",
    "finite",
    "safe",
];

const STRING_CHECKS: &[&str] = &[
    "email",
    "url",
    "uuid",
    "cuid",
    "regex",
    "startsWith",
    "endsWith",
    "includes",
    "trim",
    "toLowerCase",
    "toUpperCase",
    "datetime",
    "date",
    "time",
    "ip",
];

const SIZE_CHECKS: &[&str] = &["min", "max", "length", "nonempty"];

const OBJECT_METHODS: &[&str] = &[
    "strict",
    "passthrough",
    "strip",
    "catchall",
    "partial",
    "required",
    "extend",
    "merge",
    "pick",
    "omit",
    "keyof",
];

const FUNCTION_METHODS: &[&str] = &["args", "input", "returns", "output"];

/// Methods whose arguments may include an arrow function.
const CALLBACK_METHODS: &[&str] = &["refine", "superRefine", "check", "default", "prefault", "catch"];

/// Globals readable from anywhere.
const SAFE_GLOBALS: &[&str] = &["undefined", "NaN", "Infinity"];

/// Member names never readable, even inside refinement bodies.
const FORBIDDEN_MEMBERS: &[&str] = &[
    "constructor",
    "prototype",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "call",
    "apply",
    "bind",
];

fn is_method(name: &str) -> bool {
    [
        WRAPPER_METHODS,
        NUMBER_CHECKS,
        STRING_CHECKS,
        SIZE_CHECKS,
        OBJECT_METHODS,
        FUNCTION_METHODS,
    ]
    .iter()
    .any(|list| list.contains(&name))
}

fn is_namespace(e: &Expr) -> bool {
    matches!(&e.kind, ExprKind::Ident(name) if name == "z")
}

// ──────────────────────────────────────────────
// Validation walk
// ──────────────────────────────────────────────

struct Guard {
    nodes: usize,
    max_nodes: usize,
}

impl Guard {
    fn count(&mut self, n: usize) -> Result<(), EvalError> {
        self.nodes += n;
        if self.nodes > self.max_nodes {
            return Err(EvalError::ComplexityExceeded {
                detail: format!("more than {} syntax nodes", self.max_nodes),
            });
        }
        Ok(())
    }

    /// Walk an expression in builder position.
    fn check_schema(&mut self, e: &Expr) -> Result<(), EvalError> {
        self.count(1)?;
        match &e.kind {
            ExprKind::Str(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Regex { .. } => Ok(()),
            ExprKind::Ident(name) => {
                if name == "z" || SAFE_GLOBALS.contains(&name.as_str()) {
                    Ok(())
                } else {
                    Err(EvalError::unsafe_operation(e.line, name))
                }
            }
            ExprKind::Array(items) => items.iter().try_for_each(|i| self.check_schema(i)),
            ExprKind::Object(props) => props.iter().try_for_each(|p| {
                self.count(1)?;
                self.check_schema(&p.value)
            }),
            ExprKind::Member {
                object, property, ..
            } => {
                self.count(1)?;
                let allowed = if is_namespace(object) {
                    FACTORIES.contains(&property.as_str())
                } else {
                    is_method(property)
                };
                if !allowed {
                    return Err(EvalError::unsafe_operation(e.line, property));
                }
                self.check_schema(object)
            }
            ExprKind::Index { index, .. } => Err(EvalError::unsafe_operation(
                e.line,
                index.as_str().unwrap_or("computed member access"),
            )),
            ExprKind::Call { callee, args } => {
                self.check_schema(callee)?;
                let takes_callback = matches!(
                    &callee.kind,
                    ExprKind::Member { property, .. } if CALLBACK_METHODS.contains(&property.as_str())
                );
                for arg in args {
                    match &arg.kind {
                        ExprKind::Arrow { params, body } if takes_callback => {
                            self.count(1 + params.len())?;
                            self.check_body(body, params)?;
                        }
                        _ => self.check_schema(arg)?,
                    }
                }
                Ok(())
            }
            ExprKind::Arrow { .. } => Err(EvalError::syntax(
                e.line,
                "function expressions are only allowed as refinement or default callbacks",
            )),
            ExprKind::Unary {
                op: UnaryOp::Neg | UnaryOp::Plus,
                operand,
            } if matches!(operand.kind, ExprKind::Int(_) | ExprKind::Float(_)) => self.count(1),
            ExprKind::Unary { .. } | ExprKind::Binary { .. } | ExprKind::Conditional { .. } => {
                Err(EvalError::syntax(
                    e.line,
                    "operators are only allowed inside refinement callbacks",
                ))
            }
        }
    }

    /// Walk the body of a callback. Only the callback's own parameters and
    /// the safe globals are readable.
    fn check_body(&mut self, e: &Expr, scope: &[String]) -> Result<(), EvalError> {
        self.count(1)?;
        match &e.kind {
            ExprKind::Str(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Regex { .. } => Ok(()),
            ExprKind::Ident(name) => {
                if scope.contains(name) || SAFE_GLOBALS.contains(&name.as_str()) {
                    Ok(())
                } else {
                    Err(EvalError::unsafe_operation(e.line, name))
                }
            }
            ExprKind::Array(items) => items.iter().try_for_each(|i| self.check_body(i, scope)),
            ExprKind::Object(props) => props.iter().try_for_each(|p| {
                self.count(1)?;
                self.check_body(&p.value, scope)
            }),
            ExprKind::Member {
                object, property, ..
            } => {
                self.check_body(object, scope)?;
                self.count(1)?;
                if FORBIDDEN_MEMBERS.contains(&property.as_str()) {
                    return Err(EvalError::unsafe_operation(e.line, property));
                }
                Ok(())
            }
            ExprKind::Index { object, index, .. } => {
                self.check_body(object, scope)?;
                match &index.kind {
                    ExprKind::Str(key) if FORBIDDEN_MEMBERS.contains(&key.as_str()) => {
                        return Err(EvalError::unsafe_operation(index.line, key));
                    }
                    ExprKind::Str(_) | ExprKind::Int(_) | ExprKind::Ident(_) => {}
                    _ => {
                        return Err(EvalError::unsafe_operation(
                            index.line,
                            "computed member access",
                        ));
                    }
                }
                self.check_body(index, scope)
            }
            ExprKind::Call { callee, args } => {
                self.check_body(callee, scope)?;
                args.iter().try_for_each(|a| self.check_body(a, scope))
            }
            ExprKind::Arrow { params, body } => {
                self.count(params.len())?;
                let mut inner: Vec<String> = scope.to_vec();
                inner.extend(params.iter().cloned());
                self.check_body(body, &inner)
            }
            ExprKind::Unary { operand, .. } => self.check_body(operand, scope),
            ExprKind::Binary { left, right, .. } => {
                self.check_body(left, scope)?;
                self.check_body(right, scope)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.check_body(test, scope)?;
                self.check_body(consequent, scope)?;
                self.check_body(alternate, scope)
            }
        }
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

/// Intermediate value produced while building.
#[derive(Debug)]
enum Val {
    Namespace,
    Schema(Descriptor),
    Json(Value),
    List(Vec<Val>),
    Map(Vec<(String, Val)>),
    Regex,
    Callback,
}

impl Val {
    fn describe(&self) -> &'static str {
        match self {
            Val::Namespace => "the z namespace",
            Val::Schema(_) => "a schema",
            Val::Json(_) => "a literal",
            Val::List(_) => "an array literal",
            Val::Map(_) => "an object literal",
            Val::Regex => "a regular expression",
            Val::Callback => "a function",
        }
    }
}

fn build(e: &Expr) -> Result<Val, EvalError> {
    let v = match &e.kind {
        ExprKind::Ident(name) if name == "z" => Val::Namespace,
        ExprKind::Ident(_) => Val::Json(Value::Null),
        ExprKind::Str(s) => Val::Json(Value::String(s.clone())),
        ExprKind::Int(n) => Val::Json(Value::from(*n)),
        ExprKind::Float(f) => Val::Json(float_value(*f)),
        ExprKind::Bool(b) => Val::Json(Value::Bool(*b)),
        ExprKind::Null => Val::Json(Value::Null),
        ExprKind::Regex { .. } => Val::Regex,
        ExprKind::Array(items) => Val::List(items.iter().map(build).collect::<Result<_, _>>()?),
        ExprKind::Object(props) => Val::Map(
            props
                .iter()
                .map(|p| Ok((p.key.clone(), build(&p.value)?)))
                .collect::<Result<_, EvalError>>()?,
        ),
        ExprKind::Arrow { .. } => Val::Callback,
        ExprKind::Unary { op, operand } => match (op, &operand.kind) {
            (UnaryOp::Neg, ExprKind::Int(n)) => Val::Json(Value::from(-n)),
            (UnaryOp::Neg, ExprKind::Float(f)) => Val::Json(float_value(-f)),
            (UnaryOp::Plus, _) => build(operand)?,
            _ => return Err(EvalError::syntax(e.line, "unsupported operator")),
        },
        ExprKind::Member { property, .. } => {
            return Err(EvalError::syntax(
                e.line,
                format!("'{}' must be called, e.g. .{}()", property, property),
            ));
        }
        ExprKind::Call { callee, args } => {
            let ExprKind::Member {
                object, property, ..
            } = &callee.kind
            else {
                return Err(EvalError::syntax(e.line, "only builder calls are supported"));
            };
            let receiver = build(object)?;
            let args = args.iter().map(build).collect::<Result<Vec<_>, _>>()?;
            match receiver {
                Val::Namespace => Val::Schema(factory(property, args, e.line)?),
                Val::Schema(d) => Val::Schema(method(d, property, args, e.line)?),
                other => {
                    return Err(EvalError::syntax(
                        e.line,
                        format!("cannot call .{}() on {}", property, other.describe()),
                    ));
                }
            }
        }
        ExprKind::Index { .. } | ExprKind::Binary { .. } | ExprKind::Conditional { .. } => {
            return Err(EvalError::syntax(e.line, "unsupported expression"));
        }
    };
    Ok(v)
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn descriptor_err(call: &str, line: u32) -> impl Fn(DescriptorError) -> EvalError + '_ {
    move |e| EvalError::syntax(line, format!("{}: {}", call, e))
}

fn required(v: Option<Val>, call: &str, line: u32) -> Result<Val, EvalError> {
    v.ok_or_else(|| EvalError::syntax(line, format!("{} expects an argument", call)))
}

fn into_schema(v: Val, call: &str, line: u32) -> Result<Descriptor, EvalError> {
    match v {
        Val::Schema(d) => Ok(d),
        other => Err(EvalError::syntax(
            line,
            format!("{} expects a schema, got {}", call, other.describe()),
        )),
    }
}

fn into_schemas(v: Val, call: &str, line: u32) -> Result<Vec<Descriptor>, EvalError> {
    match v {
        Val::List(items) => items
            .into_iter()
            .map(|i| into_schema(i, call, line))
            .collect(),
        other => Err(EvalError::syntax(
            line,
            format!("{} expects an array of schemas, got {}", call, other.describe()),
        )),
    }
}

fn into_shape(v: Val, call: &str, line: u32) -> Result<IndexMap<String, Descriptor>, EvalError> {
    match v {
        Val::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| Ok((k, into_schema(v, call, line)?)))
            .collect(),
        other => Err(EvalError::syntax(
            line,
            format!("{} expects an object of schemas, got {}", call, other.describe()),
        )),
    }
}

fn into_json(v: Val, call: &str, line: u32) -> Result<Value, EvalError> {
    match v {
        Val::Json(j) => Ok(j),
        Val::List(items) => Ok(Value::Array(
            items
                .into_iter()
                .map(|i| into_json(i, call, line))
                .collect::<Result<_, _>>()?,
        )),
        Val::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k, into_json(v, call, line)?);
            }
            Ok(Value::Object(map))
        }
        other => Err(EvalError::syntax(
            line,
            format!("{} expects a literal value, got {}", call, other.describe()),
        )),
    }
}

fn into_enum_value(v: Val, call: &str, line: u32) -> Result<EnumValue, EvalError> {
    match v {
        Val::Json(Value::String(s)) => Ok(EnumValue::Str(s)),
        Val::Json(Value::Number(n)) => Ok(EnumValue::Num(n)),
        other => Err(EvalError::syntax(
            line,
            format!("{} expects string or number values, got {}", call, other.describe()),
        )),
    }
}

/// Keys of a `{ key: true }` mask, as taken by `pick`, `omit`, `partial`
/// and `required`.
fn into_mask(v: Val, call: &str, line: u32) -> Result<Vec<String>, EvalError> {
    match v {
        Val::Map(entries) => Ok(entries
            .into_iter()
            .filter(|(_, v)| matches!(v, Val::Json(Value::Bool(true))))
            .map(|(k, _)| k)
            .collect()),
        other => Err(EvalError::syntax(
            line,
            format!("{} expects a {{ key: true }} mask, got {}", call, other.describe()),
        )),
    }
}

// -- Factories on `z` --------------------------------------------

fn factory(name: &str, args: Vec<Val>, line: u32) -> Result<Descriptor, EvalError> {
    let call = format!("z.{}()", name);
    let call = call.as_str();
    let mut args = args.into_iter();

    if STRING_FACTORIES.contains(&name) {
        return Ok(Descriptor::string());
    }
    let d = match name {
        "number" | "float32" | "float64" => Descriptor::number(),
        "int" | "int32" | "uint32" | "safeint" => Descriptor::integer(),
        "boolean" => Descriptor::boolean(),
        "null" => Descriptor::null(),
        "undefined" => Descriptor::undefined(),
        "any" => Descriptor::any(),
        "unknown" => Descriptor::unknown(),
        "array" => Descriptor::array(into_schema(required(args.next(), call, line)?, call, line)?),
        "object" | "strictObject" | "looseObject" => match args.next() {
            Some(v) => Descriptor::object(into_shape(v, call, line)?),
            None => Descriptor::object(IndexMap::<String, Descriptor>::new()),
        },
        "tuple" => Descriptor::tuple(into_schemas(required(args.next(), call, line)?, call, line)?),
        "record" => {
            let first = into_schema(required(args.next(), call, line)?, call, line)?;
            let (key, value) = match args.next() {
                Some(v) => (first, into_schema(v, call, line)?),
                None => (Descriptor::string(), first),
            };
            Descriptor::record(key, value).map_err(descriptor_err(call, line))?
        }
        "enum" => {
            let values = match required(args.next(), call, line)? {
                Val::List(items) => items
                    .into_iter()
                    .map(|i| into_enum_value(i, call, line))
                    .collect::<Result<Vec<_>, _>>()?,
                Val::Map(entries) => entries
                    .into_iter()
                    .map(|(_, v)| into_enum_value(v, call, line))
                    .collect::<Result<Vec<_>, _>>()?,
                other => {
                    return Err(EvalError::syntax(
                        line,
                        format!("{} expects an array of values, got {}", call, other.describe()),
                    ));
                }
            };
            Descriptor::enumeration(values).map_err(descriptor_err(call, line))?
        }
        "literal" => match required(args.next(), call, line)? {
            Val::Json(Value::Bool(_)) => Descriptor::boolean(),
            Val::Json(Value::Null) => Descriptor::null(),
            Val::List(items) => Descriptor::enumeration(
                items
                    .into_iter()
                    .map(|i| into_enum_value(i, call, line))
                    .collect::<Result<Vec<_>, _>>()?,
            )
            .map_err(descriptor_err(call, line))?,
            other => Descriptor::enumeration(vec![into_enum_value(other, call, line)?])
                .map_err(descriptor_err(call, line))?,
        },
        "union" => Descriptor::union(into_schemas(required(args.next(), call, line)?, call, line)?)
            .map_err(descriptor_err(call, line))?,
        "discriminatedUnion" => {
            match required(args.next(), call, line)? {
                Val::Json(Value::String(_)) => {}
                other => {
                    return Err(EvalError::syntax(
                        line,
                        format!("{} expects a discriminator key, got {}", call, other.describe()),
                    ));
                }
            }
            let options = into_schemas(required(args.next(), call, line)?, call, line)?;
            Descriptor::union(options).map_err(descriptor_err(call, line))?
        }
        "optional" => Descriptor::optional(into_schema(required(args.next(), call, line)?, call, line)?),
        "nullable" => Descriptor::nullable(into_schema(required(args.next(), call, line)?, call, line)?),
        "nullish" => Descriptor::optional(Descriptor::nullable(into_schema(
            required(args.next(), call, line)?,
            call,
            line,
        )?)),
        "function" => function_factory(args.next(), call, line)?,
        other => {
            return Err(EvalError::syntax(
                line,
                format!("unsupported builder z.{}()", other),
            ));
        }
    };
    Ok(d)
}

/// `z.function()` or `z.function({ input, output })`.
fn function_factory(def: Option<Val>, call: &str, line: u32) -> Result<Descriptor, EvalError> {
    let mut args = Vec::new();
    let mut returns = Descriptor::unknown();
    match def {
        None => {}
        Some(Val::Map(entries)) => {
            for (key, v) in entries {
                match key.as_str() {
                    "input" => args = function_input(v, call, line)?,
                    "output" => returns = into_schema(v, call, line)?,
                    other => {
                        return Err(EvalError::syntax(
                            line,
                            format!("{} does not accept key '{}'", call, other),
                        ));
                    }
                }
            }
        }
        Some(other) => {
            return Err(EvalError::syntax(
                line,
                format!("{} expects {{ input, output }}, got {}", call, other.describe()),
            ));
        }
    }
    Ok(Descriptor::function(args, returns))
}

/// Function input: a tuple schema or an array of schemas.
fn function_input(v: Val, call: &str, line: u32) -> Result<Vec<Descriptor>, EvalError> {
    match v {
        Val::List(_) => into_schemas(v, call, line),
        Val::Schema(Descriptor {
            kind: Kind::Tuple(items),
            ..
        }) => Ok(items),
        other => Err(EvalError::syntax(
            line,
            format!("{} input must be a tuple, got {}", call, other.describe()),
        )),
    }
}

// -- Methods on a schema ------------------------------------------

fn method(d: Descriptor, name: &str, args: Vec<Val>, line: u32) -> Result<Descriptor, EvalError> {
    let call = format!(".{}()", name);
    let call = call.as_str();
    let mut args = args.into_iter();

    let out = match name {
        "optional" => Descriptor::optional(d),
        "nullable" => Descriptor::nullable(d),
        "nullish" => Descriptor::optional(Descriptor::nullable(d)),
        "default" | "prefault" | "catch" => {
            let value = match required(args.next(), call, line)? {
                Val::Callback => Value::Null,
                other => into_json(other, call, line)?,
            };
            Descriptor::with_default(d, value)
        }
        "array" => Descriptor::array(d),
        "or" => {
            let other = into_schema(required(args.next(), call, line)?, call, line)?;
            Descriptor::union(vec![d, other]).map_err(descriptor_err(call, line))?
        }
        // Descriptions carried by .describe() are dropped; only .meta() survives.
        "describe" => match required(args.next(), call, line)? {
            Val::Json(Value::String(_)) => d,
            other => {
                return Err(EvalError::syntax(
                    line,
                    format!("{} expects a string, got {}", call, other.describe()),
                ));
            }
        },
        "meta" => match into_json(required(args.next(), call, line)?, call, line)? {
            Value::Object(map) => d.with_meta(Metadata::new(map)),
            _ => {
                return Err(EvalError::syntax(
                    line,
                    format!("{} expects an object literal", call),
                ));
            }
        },
        "refine" | "superRefine" | "check" | "readonly" | "brand" => d,
        _ if OBJECT_METHODS.contains(&name) => object_method(d, name, args, call, line)?,
        _ if FUNCTION_METHODS.contains(&name) => function_method(d, name, args, call, line)?,
        _ => check(d, name, call, line)?,
    };
    Ok(out)
}

/// Validation checks. They narrow runtime values but leave the static shape
/// unchanged, except `int()` which marks a number as integral.
fn check(d: Descriptor, name: &str, call: &str, line: u32) -> Result<Descriptor, EvalError> {
    let applies = match &d.kind {
        Kind::Number { .. } => NUMBER_CHECKS.contains(&name) || name == "min" || name == "max",
        Kind::String => STRING_CHECKS.contains(&name) || SIZE_CHECKS.contains(&name),
        Kind::Array(_) => SIZE_CHECKS.contains(&name),
        _ => false,
    };
    if !applies {
        return Err(EvalError::syntax(
            line,
            format!("{} is not available on {} schemas", call, d.variant_name()),
        ));
    }
    if name == "int" {
        return Ok(Descriptor {
            kind: Kind::Number { is_integer: true },
            meta: d.meta,
        });
    }
    Ok(d)
}

fn object_method(
    d: Descriptor,
    name: &str,
    args: std::vec::IntoIter<Val>,
    call: &str,
    line: u32,
) -> Result<Descriptor, EvalError> {
    let mut args = args;
    let Descriptor {
        kind: Kind::Object(mut fields),
        meta,
    } = d
    else {
        return Err(EvalError::syntax(
            line,
            format!("{} is only available on object schemas", call),
        ));
    };

    match name {
        "strict" | "passthrough" | "strip" => {}
        "catchall" => {
            into_schema(required(args.next(), call, line)?, call, line)?;
        }
        "partial" | "required" => {
            let mask = args.next().map(|v| into_mask(v, call, line)).transpose()?;
            for (key, field) in fields.iter_mut() {
                if mask.as_ref().is_some_and(|m| !m.contains(key)) {
                    continue;
                }
                let current = std::mem::replace(field, Descriptor::unknown());
                *field = match (name, current) {
                    (
                        "required",
                        Descriptor {
                            kind: Kind::Optional(inner),
                            ..
                        },
                    ) => *inner,
                    ("partial", f) if !matches!(f.kind, Kind::Optional(_)) => {
                        Descriptor::optional(f)
                    }
                    (_, f) => f,
                };
            }
        }
        "extend" => {
            let extra = into_shape(required(args.next(), call, line)?, call, line)?;
            fields.extend(extra);
        }
        "merge" => match into_schema(required(args.next(), call, line)?, call, line)? {
            Descriptor {
                kind: Kind::Object(extra),
                ..
            } => fields.extend(extra),
            other => {
                return Err(EvalError::syntax(
                    line,
                    format!("{} expects an object schema, got {}", call, other.variant_name()),
                ));
            }
        },
        "pick" | "omit" => {
            let keys = into_mask(required(args.next(), call, line)?, call, line)?;
            if let Some(missing) = keys.iter().find(|k| !fields.contains_key(*k)) {
                return Err(EvalError::syntax(
                    line,
                    format!("{}: unknown key '{}'", call, missing),
                ));
            }
            let keep_listed = name == "pick";
            fields.retain(|k, _| keys.contains(k) == keep_listed);
        }
        "keyof" => {
            let values = fields.keys().map(|k| EnumValue::Str(k.clone())).collect();
            let mut out = Descriptor::enumeration(values).map_err(descriptor_err(call, line))?;
            out.meta = meta;
            return Ok(out);
        }
        _ => {
            return Err(EvalError::syntax(line, format!("unsupported method {}", call)));
        }
    }
    Ok(Descriptor {
        kind: Kind::Object(fields),
        meta,
    })
}

fn function_method(
    d: Descriptor,
    name: &str,
    args: std::vec::IntoIter<Val>,
    call: &str,
    line: u32,
) -> Result<Descriptor, EvalError> {
    let mut args = args;
    let Descriptor {
        kind: Kind::Function {
            args: mut params,
            mut returns,
        },
        meta,
    } = d
    else {
        return Err(EvalError::syntax(
            line,
            format!("{} is only available on function schemas", call),
        ));
    };

    match name {
        "args" => {
            params = args
                .map(|v| into_schema(v, call, line))
                .collect::<Result<_, _>>()?;
        }
        "input" => params = function_input(required(args.next(), call, line)?, call, line)?,
        _ => returns = Box::new(into_schema(required(args.next(), call, line)?, call, line)?),
    }
    Ok(Descriptor {
        kind: Kind::Function {
            args: params,
            returns,
        },
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalErrorKind;
    use crate::introspect;
    use serde_json::json;

    fn eval(src: &str) -> Result<Descriptor, EvalError> {
        evaluate(src, &EvaluateOptions::default())
    }

    fn ok(src: &str) -> Descriptor {
        match eval(src) {
            Ok(d) => d,
            Err(e) => panic!("evaluating {:?} failed: {}", src, e),
        }
    }

    #[test]
    fn evaluates_simple_object() {
        let d = ok("z.object({ name: z.string(), age: z.number() })");
        let shape = introspect::get_object_shape(&d).unwrap();
        assert!(introspect::is_string(&shape["name"]));
        assert!(introspect::is_number(&shape["age"]));
    }

    #[test]
    fn evaluates_complex_object_with_checks() {
        let d = ok(r#"
            z.object({
              id: z.string().uuid(),
              name: z.string().min(3).max(50),
              email: z.string().email(),
              age: z.number().int().positive().optional(),
              tags: z.array(z.string()),
              metadata: z.record(z.string(), z.any())
            })
        "#);
        let shape = introspect::get_object_shape(&d).unwrap();
        let age = introspect::unwrap_optional(&shape["age"]).unwrap();
        assert_eq!(introspect::is_number_integer(age), Some(true));
        assert!(introspect::is_record(&shape["metadata"]));
    }

    #[test]
    fn syntax_error_mentions_evaluation_error() {
        let err = eval("z.object({ name: z.string(, })").unwrap_err();
        assert_eq!(err.kind(), EvalErrorKind::Syntax);
        assert!(err.to_string().contains("Evaluation error"));
    }

    #[test]
    fn forbidden_global_in_refinement_is_unsafe() {
        let err =
            eval(r#"z.object({ test: z.string() }).refine(() => console.log("hello"))"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("potentially unsafe operations"));
        assert!(msg.contains("console"));
    }

    #[test]
    fn constructor_access_is_unsafe() {
        let err = eval("z.object({ test: z.string() }).constructor").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("potentially unsafe operations"));
        assert!(msg.contains("constructor"));

        let err = eval(r#"z["constructor"]"#).unwrap_err();
        assert_eq!(err.kind(), EvalErrorKind::UnsafeOperation);

        let err = eval("z.string().refine((v) => v.constructor)").unwrap_err();
        assert!(err.to_string().contains("constructor"));
    }

    #[test]
    fn refinement_with_arrow_is_allowed() {
        let d = ok(r#"z.string().refine((val) => val.length > 5, { message: "Must be more than 5 characters" })"#);
        assert!(introspect::is_string(&d));
    }

    #[test]
    fn refinement_cannot_read_outer_identifiers() {
        let err = eval("z.string().refine((val) => process.exit(1))").unwrap_err();
        assert!(err.to_string().contains("process"));
        let err = eval("z.string().refine((val) => this)").unwrap_err();
        assert!(err.to_string().contains("this"));
    }

    #[test]
    fn nested_callbacks_see_outer_params() {
        ok("z.array(z.number()).refine((xs) => xs.every((x) => x > 0 && xs.length < 10))");
    }

    #[test]
    fn arrow_outside_callback_position_is_rejected() {
        let err = eval("z.array((x) => x)").unwrap_err();
        assert_eq!(err.kind(), EvalErrorKind::Syntax);
    }

    #[test]
    fn operators_outside_callbacks_are_rejected() {
        assert!(eval("z.string().min(1 + 2)").is_err());
        ok("z.number().min(-5).max(+10)");
    }

    #[test]
    fn node_ceiling_is_enforced() {
        let mut src = String::from("z.object({");
        for i in 0..100 {
            src.push_str(&format!("prop{}: z.object({{nested: z.string()}}),", i));
        }
        src.push_str("})");
        let err = evaluate(
            &src,
            &EvaluateOptions {
                max_nodes: 200,
                ..EvaluateOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds maximum allowed complexity"));
        assert!(eval(&src).is_ok());
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let src = format!("{}z.string(){}", "z.array(".repeat(200), ")".repeat(200));
        let err = eval(&src).unwrap_err();
        assert_eq!(err.kind(), EvalErrorKind::ComplexityExceeded);
    }

    #[test]
    fn enum_values_keep_order() {
        let d = ok(r#"z.enum(["pending", "active", "completed"])"#);
        let values: Vec<String> = introspect::get_enum_values(&d)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(values, vec!["pending", "active", "completed"]);
    }

    #[test]
    fn union_options_in_order() {
        let d = ok("z.union([z.string(), z.number(), z.boolean()])");
        let options = introspect::get_union_options(&d).unwrap();
        assert_eq!(options.len(), 3);
        assert!(introspect::is_string(&options[0]));
        assert!(introspect::is_number(&options[1]));
        assert!(introspect::is_boolean(&options[2]));
    }

    #[test]
    fn describe_is_stripped_and_meta_kept() {
        let d = ok(r#"z.string().describe("A string field")"#);
        assert!(introspect::is_string(&d));
        assert!(introspect::get_meta(&d).is_none());

        let d = ok(r#"z.string().describe("desc").meta({ description: "A string field" })"#);
        assert!(introspect::is_string(&d));
        let meta = introspect::get_meta(&d).unwrap();
        assert_eq!(meta.description(), Some("A string field"));
    }

    #[test]
    fn or_and_array_shorthands() {
        let d = ok("z.string().or(z.number())");
        assert_eq!(introspect::get_union_options(&d).unwrap().len(), 2);
        let d = ok("z.string().array()");
        assert!(introspect::is_string(introspect::get_array_element(&d).unwrap()));
    }

    #[test]
    fn nullish_is_optional_of_nullable() {
        let d = ok("z.string().nullish()");
        let inner = introspect::unwrap_optional(&d).unwrap();
        assert!(introspect::is_nullable(inner));
    }

    #[test]
    fn default_keeps_literal_value() {
        let d = ok(r#"z.object({ on: z.boolean() }).default({ on: true })"#);
        let (_, value) = introspect::unwrap_default(&d).unwrap();
        assert_eq!(value, &json!({"on": true}));
        let d = ok("z.array(z.string()).default(() => [])");
        assert!(introspect::is_default(&d));
    }

    #[test]
    fn function_forms() {
        let d = ok("z.function({ input: z.tuple([z.string(), z.number()]), output: z.boolean() })");
        let (args, returns) = introspect::get_function_signature(&d).unwrap();
        assert_eq!(args.len(), 2);
        assert!(introspect::is_boolean(returns));

        let d = ok("z.function().args(z.string()).returns(z.number())");
        let (args, returns) = introspect::get_function_signature(&d).unwrap();
        assert_eq!(args.len(), 1);
        assert!(introspect::is_number(returns));

        let d = ok("z.function()");
        let (args, returns) = introspect::get_function_signature(&d).unwrap();
        assert!(args.is_empty());
        assert!(introspect::is_unknown(returns));
    }

    #[test]
    fn object_transforms() {
        let d = ok("z.object({ a: z.string(), b: z.number() }).partial({ a: true })");
        let shape = introspect::get_object_shape(&d).unwrap();
        assert!(introspect::is_optional(&shape["a"]));
        assert!(introspect::is_number(&shape["b"]));

        let d = ok("z.object({ a: z.string() }).extend({ b: z.boolean() }).omit({ a: true })");
        let keys: Vec<_> = introspect::get_object_shape(&d).unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b"]);

        let d = ok("z.object({ a: z.string(), b: z.number() }).keyof()");
        assert_eq!(introspect::get_enum_values(&d).unwrap().len(), 2);

        assert!(eval("z.object({ a: z.string() }).pick({ missing: true })").is_err());
    }

    #[test]
    fn literal_record_and_discriminated_union() {
        let d = ok("z.literal('on')");
        assert_eq!(introspect::get_enum_values(&d).unwrap().len(), 1);
        let d = ok("z.record(z.number())");
        let (key, value) = introspect::get_record_types(&d).unwrap();
        assert!(introspect::is_string(key));
        assert!(introspect::is_number(value));
        let d = ok(r#"z.discriminatedUnion("type", [
            z.object({ type: z.literal("a") }),
            z.object({ type: z.literal("b") }),
        ])"#);
        assert_eq!(introspect::get_union_options(&d).unwrap().len(), 2);
    }

    #[test]
    fn checks_must_match_receiver() {
        let err = eval("z.boolean().min(3)").unwrap_err();
        assert!(err.to_string().contains("not available on boolean"));
        assert!(eval("z.string().int()").is_err());
    }

    #[test]
    fn unknown_builder_member_is_unsafe() {
        let err = eval("z.lazy(() => z.string())").unwrap_err();
        assert_eq!(err.kind(), EvalErrorKind::UnsafeOperation);
        assert!(err.to_string().contains("lazy"));
    }

    #[test]
    fn non_schema_results_are_rejected() {
        assert!(eval("'just a string'").is_err());
        assert!(eval("z.string").is_err());
        assert!(eval("z").is_err());
    }

    #[test]
    fn evaluation_is_deterministic_and_isolated() {
        let src = r#"z.object({ a: z.string().meta({ description: "x" }) })"#;
        assert_eq!(ok(src), ok(src));
        let plain = ok("z.object({ a: z.string() })");
        let shape = introspect::get_object_shape(&plain).unwrap();
        assert!(introspect::get_meta(&shape["a"]).is_none());
    }
}
