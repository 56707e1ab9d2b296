//! Configuration file support for netfacts
//!
//! Loads `.netfacts.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use netfacts_rules::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for
pub const CONFIG_FILE: &str = ".netfacts.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json", "yaml" or "text"
    pub format: Option<String>,
}

/// Engine switches given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOverrides {
    pub strict: bool,
    pub continue_on_error: bool,
}

impl Config {
    /// Load config from `.netfacts.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// The engine configuration with command-line switches applied.
    ///
    /// Flags can only switch a policy on; the file decides otherwise.
    pub fn engine_config(&self, overrides: EngineOverrides) -> EngineConfig {
        let engine = self.engine.clone();
        let strict = engine.strict || overrides.strict;
        let continue_on_error = engine.continue_on_error || overrides.continue_on_error;
        engine
            .with_strict(strict)
            .with_continue_on_error(continue_on_error)
    }
}
