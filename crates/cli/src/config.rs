//! Output configuration for `schemagen generate`.
//!
//! Read from `schemagen.config.json`. Every setting is optional; per-target
//! values fall back to the global `outputDirectory`, then to built-in
//! defaults.

use std::path::{Path, PathBuf};

use schemagen_codegen::{module_specifier, AssembleOptions, Flavor};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "schemagen.config.json";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "generated";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    pub output_directory: Option<String>,
    pub targets: TargetsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    #[serde(rename = "node-ts")]
    pub node: Option<TargetConfig>,
    #[serde(rename = "react-ts")]
    pub react: Option<TargetConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetConfig {
    pub output_directory: Option<String>,
    pub client_file_name: Option<String>,
    pub declaration_file_name: Option<String>,
    pub sdk_import: Option<String>,
}

/// Fully resolved settings for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub flavor: Flavor,
    pub output_directory: PathBuf,
    pub client_file_name: String,
    pub declaration_file_name: String,
    pub sdk_import: String,
}

impl ResolvedTarget {
    pub fn client_path(&self) -> PathBuf {
        self.output_directory.join(&self.client_file_name)
    }

    pub fn declaration_path(&self) -> PathBuf {
        self.output_directory.join(&self.declaration_file_name)
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            flavor: self.flavor,
            sdk_import: self.sdk_import.clone(),
            declaration_import: module_specifier(&self.declaration_file_name),
        }
    }
}

fn default_file_names(flavor: Flavor) -> (&'static str, &'static str) {
    match flavor {
        Flavor::Node => ("schemagen-server.ts", "schemagen-server-types.d.ts"),
        Flavor::React => ("schemagen-client.ts", "schemagen-client-types.d.ts"),
    }
}

impl GeneratorConfig {
    /// Load the config at `path`. A missing file yields the defaults; a
    /// file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(GeneratorConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
    }

    fn target(&self, flavor: Flavor) -> Option<&TargetConfig> {
        match flavor {
            Flavor::Node => self.targets.node.as_ref(),
            Flavor::React => self.targets.react.as_ref(),
        }
    }

    /// Settings for `flavor`, with every fallback applied.
    pub fn resolve(&self, flavor: Flavor) -> ResolvedTarget {
        let target = self.target(flavor).cloned().unwrap_or_default();
        let (client, declaration) = default_file_names(flavor);
        let output_directory = target
            .output_directory
            .or_else(|| self.output_directory.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_owned());
        ResolvedTarget {
            flavor,
            output_directory: PathBuf::from(output_directory),
            client_file_name: target.client_file_name.unwrap_or_else(|| client.to_owned()),
            declaration_file_name: target
                .declaration_file_name
                .unwrap_or_else(|| declaration.to_owned()),
            sdk_import: target
                .sdk_import
                .unwrap_or_else(|| flavor.default_sdk_import().to_owned()),
        }
    }
}

/// Parse a comma-separated target list, keeping first-seen order and
/// dropping duplicates.
pub fn parse_targets(list: &str) -> Result<Vec<Flavor>, String> {
    let mut flavors = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let flavor: Flavor = name.parse().map_err(|e| format!("{}", e))?;
        if !flavors.contains(&flavor) {
            flavors.push(flavor);
        }
    }
    if flavors.is_empty() {
        return Err("no targets given".to_owned());
    }
    Ok(flavors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let config = GeneratorConfig::default();
        let node = config.resolve(Flavor::Node);
        assert_eq!(node.output_directory, PathBuf::from("generated"));
        assert_eq!(node.client_file_name, "schemagen-server.ts");
        assert_eq!(node.declaration_file_name, "schemagen-server-types.d.ts");
        assert_eq!(node.sdk_import, "@reforge-com/node");

        let react = config.resolve(Flavor::React);
        assert_eq!(react.client_file_name, "schemagen-client.ts");
        assert_eq!(react.declaration_file_name, "schemagen-client-types.d.ts");
        assert_eq!(
            react.assemble_options().declaration_import,
            "./schemagen-client-types"
        );
    }

    #[test]
    fn target_values_override_global_ones() {
        let config: GeneratorConfig = serde_json::from_str(
            r#"{
              "outputDirectory": "out",
              "targets": {
                "react-ts": { "outputDirectory": "web/src", "clientFileName": "config.ts" },
                "node-ts": { "declarationFileName": "types.d.ts", "sdkImport": "@acme/sdk" }
              }
            }"#,
        )
        .unwrap();

        let react = config.resolve(Flavor::React);
        assert_eq!(react.client_path(), PathBuf::from("web/src/config.ts"));

        let node = config.resolve(Flavor::Node);
        assert_eq!(node.output_directory, PathBuf::from("out"));
        assert_eq!(node.declaration_path(), PathBuf::from("out/types.d.ts"));
        assert_eq!(node.assemble_options().sdk_import, "@acme/sdk");
        assert_eq!(node.assemble_options().declaration_import, "./types");
    }

    #[test]
    fn missing_file_uses_defaults_and_bad_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = GeneratorConfig::load(&absent).unwrap();
        assert!(config.output_directory.is_none());

        std::fs::write(&absent, "{ not json").unwrap();
        let err = GeneratorConfig::load(&absent).unwrap_err();
        assert!(err.starts_with("error parsing config"));
    }

    #[test]
    fn target_lists() {
        assert_eq!(
            parse_targets("react-ts, node-ts,react-ts").unwrap(),
            vec![Flavor::React, Flavor::Node]
        );
        assert_eq!(
            parse_targets("node-ts,swift").unwrap_err(),
            "Unsupported target: swift"
        );
        assert!(parse_targets(" , ").is_err());
    }
}
