//! Seed variables from `--vars FILE` and `--var key=value`

use anyhow::{bail, Context, Result};
use netfacts_core::{Map, Value};
use std::path::Path;

/// Parse one `key=value` pair; the value is read as a YAML scalar, so
/// `mtu=1500` seeds a number and `name=leaf01` a string
pub fn parse_var(pair: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("Invalid variable '{}', expected key=value", pair);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid variable '{}', the name is empty", pair);
    }

    let value = if raw.is_empty() {
        Value::String(String::new())
    } else {
        serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    };
    Ok((key.to_string(), value))
}

/// Load a YAML or JSON mapping of variables
pub fn load_vars_file(path: &Path) -> Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("{} must contain a mapping of variables", path.display()),
    }
}

/// Merge the vars file and the `--var` pairs; pairs win
pub fn seed_vars(file: Option<&Path>, pairs: &[String]) -> Result<Map<String, Value>> {
    let mut vars = match file {
        Some(path) => load_vars_file(path)?,
        None => Map::new(),
    };
    for pair in pairs {
        let (key, value) = parse_var(pair)?;
        vars.insert(key, value);
    }
    Ok(vars)
}
