use schemagen_core::EvalError;

/// Error type for code generation operations.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The manifest JSON is malformed or missing required fields.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The manifest could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generation target name that is not recognized.
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// Two manifest entries share a key.
    #[error("duplicate config key '{0}'")]
    DuplicateKey(String),

    /// A schema attached to a config entry failed to evaluate.
    #[error("schema for '{key}': {source}")]
    Schema {
        key: String,
        #[source]
        source: EvalError,
    },
}

impl From<serde_json::Error> for CodegenError {
    fn from(e: serde_json::Error) -> Self {
        CodegenError::InvalidManifest(e.to_string())
    }
}
