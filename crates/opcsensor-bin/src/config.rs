// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Resource configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Parse the JSON or YAML file into a [`ResourceConfig`], or start from
//!    an empty one named after `--name`
//! 2. Apply `--endpoint`, `--nodeids` and `--subscribe` over `attributes`
//!
//! Attribute validation is left to the sensor factory.

use std::fs;
use std::path::Path;

use opcsensor_core::ResourceConfig;
use opcsensor_opcua::model;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{BinError, BinResult};

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    pub fn from_path(path: &Path) -> BinResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some(other) => Err(BinError::config(format!(
                "unsupported config format '{}', expected .json, .yaml or .yml",
                other
            ))),
            None => Err(BinError::config(format!(
                "cannot detect config format of '{}'",
                path.display()
            ))),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads a resource configuration file.
pub fn load_resource_config(path: &Path) -> BinResult<ResourceConfig> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| BinError::io(e.to_string()).with_context(format!("Failed to read {}", path.display())))?;

    debug!(path = %path.display(), ?format, "Loading resource configuration");
    parse_resource_config(&content, format)
        .map_err(|e| e.with_context(format!("Failed to parse {}", path.display())))
}

/// Parses a resource configuration from a string.
pub fn parse_resource_config(content: &str, format: ConfigFormat) -> BinResult<ResourceConfig> {
    match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| BinError::config(e.to_string())),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| BinError::config(e.to_string())),
    }
}

/// Builds the resource configuration for this invocation.
///
/// Starts from `--config` when given, otherwise from an empty configuration
/// for the OPC UA sensor model, then applies the attribute flags.
pub fn resolve(cli: &Cli) -> BinResult<ResourceConfig> {
    let mut config = match &cli.config {
        Some(path) => load_resource_config(path)?,
        None => ResourceConfig::new(cli.name.clone(), model(), Value::Object(Map::new())),
    };
    apply_overrides(&mut config, cli)?;
    Ok(config)
}

/// Applies the command line attribute overrides.
pub fn apply_overrides(config: &mut ResourceConfig, cli: &Cli) -> BinResult<()> {
    if !config.attributes.is_object() {
        if cli.endpoint.is_none() && cli.nodeids.is_none() && cli.subscribe.is_none() {
            return Ok(());
        }
        config.attributes = Value::Object(Map::new());
    }
    let Some(attributes) = config.attributes.as_object_mut() else {
        return Ok(());
    };

    if let Some(endpoint) = &cli.endpoint {
        attributes.insert("endpoint".to_string(), Value::String(endpoint.clone()));
    }
    if let Some(nodeids) = &cli.nodeids {
        let parsed: Vec<String> = serde_json::from_str(nodeids)
            .map_err(|e| BinError::config(format!("--nodeids must be a JSON array of strings: {}", e)))?;
        attributes.insert(
            "nodeids".to_string(),
            Value::Array(parsed.into_iter().map(Value::String).collect()),
        );
    }
    if let Some(subscribe) = &cli.subscribe {
        attributes.insert("subscribe".to_string(), Value::String(subscribe.clone()));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
name: plc
model: viam-soleng:opc-ua:opcsensor
attributes:
  endpoint: opc.tcp://plc:4840
  nodeids:
    - ns=2;i=2
    - ns=2;i=3
  subscribe: data
"#;

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")).unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.YAML")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")).unwrap(), ConfigFormat::Yaml);
        assert!(ConfigFormat::from_path(Path::new("a.toml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = load_resource_config(file.path()).unwrap();
        assert_eq!(config.name, "plc");
        assert_eq!(config.model, model());
        assert_eq!(config.attributes["nodeids"], json!(["ns=2;i=2", "ns=2;i=3"]));
        assert_eq!(config.attributes["subscribe"], "data");
    }

    #[test]
    fn test_load_json_without_attributes() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{"name": "plc", "model": "viam-soleng:opc-ua:opcsensor"}"#)
            .unwrap();

        let config = load_resource_config(file.path()).unwrap();
        assert_eq!(config.attributes, json!({}));
    }

    #[test]
    fn test_load_rejects_bad_model() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{"name": "plc", "model": "opcsensor"}"#).unwrap();

        let err = load_resource_config(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_resource_config(Path::new("/nonexistent/opcsensor.yaml")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_resolve_from_flags_only() {
        let cli = Cli::parse_from([
            "opcsensor",
            "--name",
            "line-1",
            "--endpoint",
            "opc.tcp://plc:4840",
            "--nodeids",
            r#"["ns=2;i=3"]"#,
            "read",
        ]);
        let config = resolve(&cli).unwrap();
        assert_eq!(config.name, "line-1");
        assert_eq!(
            config.attributes,
            json!({ "endpoint": "opc.tcp://plc:4840", "nodeids": ["ns=2;i=3"] })
        );
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::parse_from(["opcsensor", "-c", &path, "--subscribe", "", "read"]);
        let config = resolve(&cli).unwrap();
        assert_eq!(config.attributes["subscribe"], "");
        assert_eq!(config.attributes["endpoint"], "opc.tcp://plc:4840");
    }

    #[test]
    fn test_bad_nodeids_flag() {
        let cli = Cli::parse_from(["opcsensor", "--nodeids", "ns=2;i=3", "read"]);
        let err = resolve(&cli).unwrap_err();
        assert!(err.to_string().contains("--nodeids"));
    }
}
