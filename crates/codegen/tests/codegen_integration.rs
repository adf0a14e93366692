//! Integration tests for the generation pipeline.
//!
//! These tests drive a manifest file on disk through resolution and
//! assembly, and check the properties the renderers must preserve.

use schemagen_codegen::{
    assemble, assemble_parallel, AssembleOptions, CodegenError, DslRenderer, Flavor, Manifest,
    TypeMapper,
};
use schemagen_core::{evaluate, EvaluateOptions};
use std::fs;

const MANIFEST: &str = r#"{
  "configs": [
    {
      "key": "user-schema",
      "configType": "SCHEMA",
      "valueType": "STRING",
      "rows": [{ "values": [{ "value": { "schema": {
        "schema": "z.object({ name: z.string(), greet: z.function({input: z.tuple([z.string()]), output: z.string()}) })",
        "schemaType": "ZOD"
      } } }] }]
    },
    {
      "key": "user",
      "configType": "CONFIG",
      "valueType": "JSON",
      "schemaKey": "user-schema",
      "sendToClientSdk": true,
      "rows": []
    },
    {
      "key": "limits",
      "configType": "CONFIG",
      "valueType": "JSON",
      "rows": [{ "values": [{ "value": { "json": { "json": "{\"max\": 10, \"tags\": [\"a\", \"b\"]}" } } }] }]
    },
    {
      "key": "dark-mode",
      "configType": "FEATURE_FLAG",
      "valueType": "BOOL",
      "rows": []
    }
  ]
}"#;

fn write_manifest(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("manifest.json");
    fs::write(&path, MANIFEST).expect("write manifest");
    path
}

#[test]
fn manifest_file_generates_node_modules() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manifest = Manifest::from_path(&write_manifest(&dir)).expect("manifest loads");

    let resolution = manifest.resolve(Flavor::Node, &EvaluateOptions::default());
    assert!(resolution.failures.is_empty());
    let keys: Vec<&str> = resolution.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["user", "limits", "dark-mode"]);

    let out = assemble(&resolution.entries, &AssembleOptions::new(Flavor::Node));
    assert!(out.declaration.contains(
        "  \"user\": { \"name\": string; \"greet\": (...params: [string]) => string };\n"
    ));
    assert!(out
        .declaration
        .contains("  \"user\": { \"name\": string; \"greet\": string | undefined };\n"));
    assert!(out
        .declaration
        .contains("  \"limits\": { \"max\": number; \"tags\": Array<string> };\n"));
    assert!(out.declaration.contains("  \"dark-mode\": boolean;\n"));

    assert!(out.client.contains("import Mustache from 'mustache';"));
    assert!(out
        .client
        .contains("  \"dark-mode\": (raw: any) => raw,\n"));
    assert!(out.client.contains("export class TypedConfig"));
}

#[test]
fn react_target_only_sees_client_entries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manifest = Manifest::from_path(&write_manifest(&dir)).expect("manifest loads");

    let resolution = manifest.resolve(Flavor::React, &EvaluateOptions::default());
    let keys: Vec<&str> = resolution.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["user", "dark-mode"]);

    let out = assemble(&resolution.entries, &AssembleOptions::new(Flavor::React));
    assert!(!out.declaration.contains("limits"));
    assert!(out.client.contains("import { useReforge } from '@reforge-com/react';"));
}

#[test]
fn unsafe_schema_falls_back_without_stopping_generation() {
    let text = MANIFEST.replace(
        "z.object({ name: z.string(), greet: z.function({input: z.tuple([z.string()]), output: z.string()}) })",
        "z.string().refine(x => eval(x))",
    );
    let manifest = Manifest::from_json(&text).expect("manifest parses");
    let resolution = manifest.resolve(Flavor::Node, &EvaluateOptions::default());

    assert_eq!(resolution.entries.len(), 3);
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].key, "user");
    assert!(matches!(
        resolution.failures[0].error,
        CodegenError::Schema { .. }
    ));

    let out = assemble(&resolution.entries, &AssembleOptions::new(Flavor::Node));
    assert!(out.declaration.contains("  \"user\": any;\n"));
    assert!(!out.client.contains("Mustache"));
}

#[test]
fn missing_manifest_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = Manifest::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CodegenError::Io(_)));
}

#[test]
fn assembly_is_deterministic_and_parallel_safe() {
    let manifest = Manifest::from_json(MANIFEST).expect("manifest parses");
    let resolution = manifest.resolve(Flavor::Node, &EvaluateOptions::default());
    let options = AssembleOptions::new(Flavor::Node);

    let first = assemble(&resolution.entries, &options);
    let second = assemble(&resolution.entries, &options);
    assert_eq!(first, second);
    assert_eq!(first, assemble_parallel(&resolution.entries, &options));
}

#[test]
fn dsl_output_evaluates_to_the_same_descriptor() {
    let opts = EvaluateOptions::default();
    for src in [
        "z.string()",
        "z.number()",
        "z.number().int()",
        "z.boolean()",
        "z.any()",
        "z.unknown()",
        "z.null()",
        "z.undefined()",
        "z.optional(z.string())",
        "z.array(z.boolean()).optional()",
        "z.object({ a: z.string() }).nullable()",
        "z.array(z.number()).nullable()",
        "z.enum([1, 2.5, -3])",
        "z.enum([1, 'a'])",
        r#"z.enum(["a\nb", "tab\there", "quote'd", "sep\u2028x"])"#,
        r#"z.string().meta({ description: "x\by\fz" })"#,
        "z.string().nullable()",
        r#"z.enum(["light", "dark"])"#,
        "z.union([z.string(), z.number(), z.null()])",
        "z.tuple([z.string(), z.number().int()])",
        "z.record(z.string(), z.array(z.number()))",
        "z.function({input: z.tuple([z.string()]), output: z.boolean()})",
        r#"z.object({ id: z.string().meta({ description: "Primary key" }), "content-type": z.string() })"#,
        r#"z.object({ nested: z.object({ flag: z.boolean().optional() }) }).meta({ title: "Nested", version: 2 })"#,
    ] {
        let first = evaluate(src, &opts).expect("source evaluates");
        let rendered = DslRenderer.resolve(&first);
        let reparsed = evaluate(&rendered, &opts)
            .unwrap_or_else(|e| panic!("rendered `{}` failed to evaluate: {}", rendered, e));
        assert_eq!(first, reparsed, "round trip of {}", src);
    }
}
