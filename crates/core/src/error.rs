use serde::Serialize;

/// Class of an evaluation failure, for callers that react differently to
/// each (e.g. "simplify your schema" guidance on complexity errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalErrorKind {
    Syntax,
    UnsafeOperation,
    ComplexityExceeded,
}

/// A schema evaluation error. Always returned as a value; the evaluator
/// never panics on malformed input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Malformed DSL text, or a builder call with invalid arguments.
    #[error("Evaluation error: {message} (line {line})")]
    Syntax { line: u32, message: String },

    /// An identifier or member outside the whitelist.
    #[error("Schema contains potentially unsafe operations: {name}")]
    UnsafeOperation { line: u32, name: String },

    /// The node-count or nesting ceiling was breached.
    #[error("Schema exceeds maximum allowed complexity ({detail})")]
    ComplexityExceeded { detail: String },
}

impl EvalError {
    pub fn syntax(line: u32, message: impl Into<String>) -> Self {
        EvalError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn unsafe_operation(line: u32, name: impl Into<String>) -> Self {
        EvalError::UnsafeOperation {
            line,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> EvalErrorKind {
        match self {
            EvalError::Syntax { .. } => EvalErrorKind::Syntax,
            EvalError::UnsafeOperation { .. } => EvalErrorKind::UnsafeOperation,
            EvalError::ComplexityExceeded { .. } => EvalErrorKind::ComplexityExceeded,
        }
    }

    /// JSON form used by the CLI's `--output json` mode.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}
