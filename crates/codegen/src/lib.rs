//! schemagen-codegen: descriptor renderers and TypeScript module assembly.
//!
//! Renderers implement [`TypeMapper`] and differ only in what they emit for
//! each descriptor variant. The [`assembler`] combines their output for a
//! resolved [`Manifest`] into a client module and a declaration module.

pub mod accessor;
pub mod assembler;
pub mod dsl;
pub mod error;
pub mod manifest;
pub mod mapper;
pub mod typescript;

pub use accessor::{AccessorRenderer, PathSegment};
pub use assembler::{
    assemble, assemble_parallel, module_specifier, AssembleOptions, Flavor, GeneratedModules,
};
pub use dsl::DslRenderer;
pub use error::CodegenError;
pub use manifest::{ConfigEntry, EntryFailure, Manifest, Resolution, ResolvedEntry};
pub use mapper::TypeMapper;
pub use typescript::{Target, TypeScriptRenderer};
