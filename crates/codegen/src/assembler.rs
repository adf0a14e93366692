//! Composes per-entry renderings into complete TypeScript modules.
//!
//! Every target produces two modules: a declaration module with the static
//! types of all entries, and a client module with one accessor per entry
//! plus a thin wrapper around the consumer SDK. The two flavors differ only
//! in that wrapper.

use crate::accessor::{description_comment, AccessorRenderer};
use crate::error::CodegenError;
use crate::manifest::{ConfigEntry, ConfigType, ResolvedEntry};
use crate::mapper::{quote, TypeMapper};
use crate::typescript::{Target, TypeScriptRenderer};
use rayon::prelude::*;
use schemagen_core::introspect;
use std::fmt;
use std::str::FromStr;

const HEADER: &str = "// Generated by schemagen. Do not edit by hand.\n";

// ──────────────────────────────────────────────
// Flavors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    /// Server-side class around the node SDK.
    Node,
    /// Hook around the React client SDK.
    React,
}

impl Flavor {
    pub const ALL: [Flavor; 2] = [Flavor::Node, Flavor::React];

    pub fn as_str(self) -> &'static str {
        match self {
            Flavor::Node => "node-ts",
            Flavor::React => "react-ts",
        }
    }

    pub fn default_sdk_import(self) -> &'static str {
        match self {
            Flavor::Node => "@reforge-com/node",
            Flavor::React => "@reforge-com/react",
        }
    }

    /// Whether this flavor emits `entry`. Schema entries never are; the
    /// client flavor only sees entries shipped to client SDKs.
    pub fn includes(self, entry: &ConfigEntry) -> bool {
        match (self, entry.config_type) {
            (_, ConfigType::FeatureFlag) => true,
            (Flavor::Node, ConfigType::Config) => true,
            (Flavor::React, ConfigType::Config) => entry.send_to_client_sdk,
            _ => false,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node-ts" => Ok(Flavor::Node),
            "react-ts" => Ok(Flavor::React),
            _ => Err(CodegenError::UnsupportedTarget(s.to_owned())),
        }
    }
}

// ──────────────────────────────────────────────
// Assembly
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub flavor: Flavor,
    /// Module the SDK binding is imported from.
    pub sdk_import: String,
    /// Module specifier the client uses to import the declaration module.
    pub declaration_import: String,
}

impl AssembleOptions {
    pub fn new(flavor: Flavor) -> Self {
        let declaration = match flavor {
            Flavor::Node => "schemagen-server-types.d.ts",
            Flavor::React => "schemagen-client-types.d.ts",
        };
        AssembleOptions {
            flavor,
            sdk_import: flavor.default_sdk_import().to_owned(),
            declaration_import: module_specifier(declaration),
        }
    }
}

/// `./name` for a generated file, with `.d.ts` / `.ts` stripped.
pub fn module_specifier(file_name: &str) -> String {
    let stem = file_name
        .strip_suffix(".d.ts")
        .or_else(|| file_name.strip_suffix(".ts"))
        .unwrap_or(file_name);
    format!("./{}", stem)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModules {
    pub client: String,
    pub declaration: String,
}

/// Everything generated for one entry.
struct Rendered {
    type_field: String,
    raw_field: String,
    accessor: String,
    uses_template: bool,
}

fn render_entry(entry: &ResolvedEntry) -> Rendered {
    let d = &entry.descriptor;
    let types = TypeScriptRenderer::new(entry.key.as_str());
    let accessor = AccessorRenderer::new(entry.key.as_str());
    Rendered {
        type_field: types.render_field(d),
        raw_field: types.with_target(Target::Raw).render_field(d),
        accessor: format!(
            "{}{}: (raw: any) => {}",
            description_comment(d),
            quote(&entry.key),
            accessor.resolve(d)
        ),
        uses_template: introspect::contains_function(d),
    }
}

/// Assemble the client and declaration modules for `entries`, in order.
pub fn assemble(entries: &[ResolvedEntry], options: &AssembleOptions) -> GeneratedModules {
    let rendered: Vec<Rendered> = entries.iter().map(render_entry).collect();
    compose(&rendered, options)
}

/// Same output as [`assemble`], rendering entries on the rayon pool.
pub fn assemble_parallel(entries: &[ResolvedEntry], options: &AssembleOptions) -> GeneratedModules {
    let rendered: Vec<Rendered> = entries.par_iter().map(render_entry).collect();
    compose(&rendered, options)
}

fn compose(rendered: &[Rendered], options: &AssembleOptions) -> GeneratedModules {
    tracing::debug!(
        flavor = options.flavor.as_str(),
        entries = rendered.len(),
        "assembling modules"
    );
    GeneratedModules {
        client: client_module(rendered, options),
        declaration: declaration_module(rendered),
    }
}

/// Indent every line of `text` by `indent`, then close with `terminator`.
fn push_member(out: &mut String, text: &str, indent: &str, terminator: &str) {
    for line in text.lines() {
        out.push_str(indent);
        out.push_str(line);
        out.push('\n');
    }
    // Drop the final newline so the terminator sits on the member's last line.
    out.pop();
    out.push_str(terminator);
    out.push('\n');
}

fn declaration_module(rendered: &[Rendered]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    out.push_str("export interface GeneratedConfigs {\n");
    for r in rendered {
        push_member(&mut out, &r.type_field, "  ", ";");
    }
    out.push_str("}\n\n");

    out.push_str("export interface GeneratedRawConfigs {\n");
    for r in rendered {
        push_member(&mut out, &r.raw_field, "  ", ";");
    }
    out.push_str("}\n\n");

    out.push_str("export type ConfigKey = keyof GeneratedConfigs;\n");
    out
}

fn client_module(rendered: &[Rendered], options: &AssembleOptions) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    // ── Imports ──
    if rendered.iter().any(|r| r.uses_template) {
        out.push_str("import Mustache from 'mustache';\n");
    }
    match options.flavor {
        Flavor::Node => out.push_str(&format!(
            "import type {{ Reforge }} from '{}';\n",
            options.sdk_import
        )),
        Flavor::React => out.push_str(&format!(
            "import {{ useReforge }} from '{}';\n",
            options.sdk_import
        )),
    }
    out.push_str(&format!(
        "import type {{ ConfigKey, GeneratedConfigs, GeneratedRawConfigs }} from '{}';\n\n",
        options.declaration_import
    ));

    // ── Accessors ──
    out.push_str(
        "export const accessors: { [K in ConfigKey]: (raw: GeneratedRawConfigs[K]) => GeneratedConfigs[K] } = {\n",
    );
    for r in rendered {
        push_member(&mut out, &r.accessor, "  ", ",");
    }
    out.push_str("};\n\n");

    // ── Wrapper ──
    match options.flavor {
        Flavor::Node => {
            out.push_str("export class TypedConfig {\n");
            out.push_str("  constructor(private readonly sdk: Reforge) {}\n\n");
            out.push_str("  get<K extends ConfigKey>(key: K): GeneratedConfigs[K] {\n");
            out.push_str(
                "    return accessors[key](this.sdk.get(key) as GeneratedRawConfigs[K]);\n",
            );
            out.push_str("  }\n");
            out.push_str("}\n");
        }
        Flavor::React => {
            out.push_str("export function useTypedConfig() {\n");
            out.push_str("  const sdk = useReforge();\n");
            out.push_str("  return {\n");
            out.push_str("    get<K extends ConfigKey>(key: K): GeneratedConfigs[K] {\n");
            out.push_str(
                "      return accessors[key](sdk.get(key) as GeneratedRawConfigs[K]);\n",
            );
            out.push_str("    },\n");
            out.push_str("  };\n");
            out.push_str("}\n");
        }
    }
    out
}
