//! CLI generate subcommand.
//!
//! manifest -> resolve per target -> assemble -> write client and
//! declaration modules. Entries whose schema could not be used are still
//! generated and listed as warnings once all targets are written.

use std::path::{Path, PathBuf};
use std::process;

use schemagen_codegen::{assemble_parallel, EntryFailure, Manifest};
use schemagen_core::EvaluateOptions;

use crate::config::{parse_targets, GeneratorConfig, ResolvedTarget};
use crate::{report_error, OutputFormat};

/// Files written for one target.
struct Written {
    target: &'static str,
    client: PathBuf,
    declaration: PathBuf,
    entries: usize,
}

pub fn cmd_generate(
    manifest_path: &Path,
    targets: &str,
    config_path: &Path,
    output: OutputFormat,
    quiet: bool,
) {
    let flavors = match parse_targets(targets) {
        Ok(f) => f,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let config = match GeneratorConfig::load(config_path) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let manifest = match Manifest::from_path(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            let msg = format!("error loading manifest '{}': {}", manifest_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let options = EvaluateOptions::default();
    let mut written = Vec::new();
    let mut warnings: Vec<EntryFailure> = Vec::new();

    for flavor in flavors {
        let target = config.resolve(flavor);
        let resolution = manifest.resolve(flavor, &options);
        let modules = assemble_parallel(&resolution.entries, &target.assemble_options());

        if let Err(msg) = write_target(&target, &modules.client, &modules.declaration) {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        written.push(Written {
            target: flavor.as_str(),
            client: target.client_path(),
            declaration: target.declaration_path(),
            entries: resolution.entries.len(),
        });

        // The same entry fails the same way for every target.
        for failure in resolution.failures {
            if !warnings.iter().any(|w| w.key == failure.key) {
                warnings.push(failure);
            }
        }
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            for w in &written {
                println!(
                    "Generated {} ({} entries): {}, {}",
                    w.target,
                    w.entries,
                    w.client.display(),
                    w.declaration.display()
                );
            }
            for failure in &warnings {
                eprintln!("warning: {}", failure.error);
            }
        }
        OutputFormat::Json => {
            let targets: Vec<serde_json::Value> = written
                .iter()
                .map(|w| {
                    serde_json::json!({
                        "target": w.target,
                        "client": w.client.display().to_string(),
                        "declaration": w.declaration.display().to_string(),
                        "entries": w.entries,
                    })
                })
                .collect();
            let warnings: Vec<serde_json::Value> = warnings
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "key": f.key,
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            let report = serde_json::json!({ "targets": targets, "warnings": warnings });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        }
    }
}

fn write_target(target: &ResolvedTarget, client: &str, declaration: &str) -> Result<(), String> {
    let dir = &target.output_directory;
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("failed to create directory '{}': {}", dir.display(), e))?;
    write_file(&target.client_path(), client)?;
    write_file(&target.declaration_path(), declaration)?;
    tracing::debug!(flavor = target.flavor.as_str(), dir = %dir.display(), "wrote modules");
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content).map_err(|e| format!("failed to write '{}': {}", path.display(), e))
}
