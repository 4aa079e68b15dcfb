//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sgf-gametree/sgf-gametree.toml`
//! 3. Explicit config file passed by the caller
//! 4. Environment variables: `SGF_GAMETREE_*` prefix, `__` between nested keys
//!    (`SGF_GAMETREE_STRINGIFY__INDENT=2`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::TreeError;

/// Defaults for rendering trees to text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StringifySettings {
    /// Spaces per nesting level, 0 renders on one line
    pub indent: usize,
    /// Merge single-child chains into one sequence
    pub collapse_chains: bool,
}

impl Default for StringifySettings {
    fn default() -> Self {
        Self {
            indent: 0,
            collapse_chains: true,
        }
    }
}

/// Raw stringify config for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawStringifySettings {
    pub indent: Option<usize>,
    pub collapse_chains: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub stringify: RawStringifySettings,
}

impl StringifySettings {
    /// Overlay wins where it specifies a value.
    pub fn merge(&self, overlay: &RawStringifySettings) -> Self {
        Self {
            indent: overlay.indent.unwrap_or(self.indent),
            collapse_chains: overlay.collapse_chains.unwrap_or(self.collapse_chains),
        }
    }
}

/// Unified configuration for sgf-gametree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Stringify defaults
    pub stringify: StringifySettings,
}

/// Get the XDG config directory for sgf-gametree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sgf-gametree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sgf-gametree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, TreeError> {
    let content = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| TreeError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            stringify: self.stringify.merge(&overlay.stringify),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional TOML file layered over the global config;
    ///   a missing file is an error, unlike the optional global one.
    pub fn load(config_file: Option<&Path>) -> Result<Self, TreeError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        Self::apply_env_overrides(current)
    }

    /// Apply SGF_GAMETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, TreeError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SGF_GAMETREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<usize>("stringify.indent") {
            settings.stringify.indent = val;
        }
        if let Ok(val) = config.get_bool("stringify.collapse_chains") {
            settings.stringify.collapse_chains = val;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = StringifySettings::default();
        let overlay = RawStringifySettings {
            indent: Some(2),
            collapse_chains: None,
        };

        let merged = base.merge(&overlay);

        assert_eq!(merged.indent, 2);
        assert!(merged.collapse_chains);
    }
}
