//! Two-file configuration loader.
//!
//! Loads `config.json` and deep-merges `secrets.json` on top of it, so API
//! keys can live in a separate file with tighter permissions:
//!
//! ```text
//! ~/.cekfakta/config.json   endpoints, ports, logging
//! ~/.cekfakta/secrets.json  { "azure_openai": { "api_key": "..." }, ... }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Configuration file names, in merge order.
pub const CONFIG_FILES: &[&str] = &["config.json", "secrets.json"];

/// Load a JSON file and return its contents as a Value.
/// Returns None if file doesn't exist.
fn load_json_file(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

/// Deep merge two JSON values.
/// Source values override target values, with object merging at each level.
fn merge_json(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(&key) {
                    Some(target_value) => merge_json(target_value, source_value),
                    None => {
                        target_map.insert(key, source_value);
                    }
                }
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

/// Load and merge every file in [`CONFIG_FILES`] from the config directory.
///
/// Keys starting with `$` (e.g. `$schema`) are dropped before merging.
pub fn load_modular_config(dir: Option<PathBuf>) -> Result<Value> {
    let cfg_dir = dir.unwrap_or_else(config_dir);
    let mut config = Value::Object(Default::default());

    tracing::debug!("Loading config from {}", cfg_dir.display());

    for file in CONFIG_FILES {
        if let Some(mut value) = load_json_file(&cfg_dir.join(file))? {
            if let Some(obj) = value.as_object_mut() {
                obj.retain(|key, _| !key.starts_with('$'));
            }
            merge_json(&mut config, value);
            tracing::debug!("Loaded {}", file);
        }
    }

    Ok(config)
}

/// Check which config files exist.
pub fn check_config_files(dir: Option<PathBuf>) -> Vec<(String, bool)> {
    let cfg_dir = dir.unwrap_or_else(config_dir);

    CONFIG_FILES
        .iter()
        .map(|file| (file.to_string(), cfg_dir.join(file).exists()))
        .collect()
}
