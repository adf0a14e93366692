//! schemagen-core: type descriptors and the ways to produce them.
//!
//! Provides the descriptor model shared by every renderer, a secure
//! evaluator that turns zod-style builder text into descriptors without
//! executing it, and inference of descriptors from sample JSON.
//!
//! # Public API
//!
//! - [`Descriptor`] -- immutable, variant-tagged type description
//! - [`introspect`] -- the only way renderers look inside a descriptor
//! - [`evaluate()`] -- DSL text to descriptor, bounded by [`EvaluateOptions`]
//! - [`infer()`] -- sample JSON to descriptor
//! - [`EvalError`] -- evaluation error type

pub mod ast;
pub mod descriptor;
pub mod error;
pub mod evaluator;
pub mod inference;
pub mod introspect;
pub mod lexer;
pub mod parser;

// ── Convenience re-exports ───────────────────────────────────────────

pub use descriptor::{Descriptor, DescriptorError, EnumValue, Metadata};
pub use error::{EvalError, EvalErrorKind};
pub use evaluator::{evaluate, EvaluateOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
pub use inference::infer;
pub use introspect::Shape;
