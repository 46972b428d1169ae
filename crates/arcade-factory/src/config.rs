//! Factory configuration
//!
//! Config is loaded with two layers of precedence (highest wins):
//! 1. Environment variables: `ARCADE_DEFINITIONS_DIR`
//! 2. Config file: `arcade.toml` (or the path given on the command line)
//!
//! A missing config file yields the defaults. A relative `definitions_dir`
//! in a config file is resolved against the directory holding that file.

use arcade_core::{ArcadeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Resource limits applied to definition scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLimits {
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,
    #[serde(default = "default_max_function_expr_depth")]
    pub max_function_expr_depth: usize,
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,
    #[serde(default = "default_max_collection_size")]
    pub max_array_size: usize,
    #[serde(default = "default_max_collection_size")]
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_expr_depth: default_max_expr_depth(),
            max_function_expr_depth: default_max_function_expr_depth(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_collection_size(),
            max_map_size: default_max_collection_size(),
        }
    }
}

fn default_max_operations() -> u64 {
    100_000
}
fn default_max_expr_depth() -> usize {
    64
}
fn default_max_function_expr_depth() -> usize {
    32
}
fn default_max_string_size() -> usize {
    4096
}
fn default_max_collection_size() -> usize {
    1024
}

/// Top-level factory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Root of the entity definitions tree
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: PathBuf,
    /// Definition file extensions, in lookup preference order
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub limits: ScriptLimits,
    /// Texture names usable in definitions, mapped to renderer texture ids
    #[serde(default)]
    pub textures: BTreeMap<String, u32>,
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from("entities")
}

fn default_extensions() -> Vec<String> {
    vec!["rhai".to_string(), "toml".to_string()]
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            definitions_dir: default_definitions_dir(),
            extensions: default_extensions(),
            limits: ScriptLimits::default(),
            textures: BTreeMap::new(),
        }
    }
}

impl FactoryConfig {
    pub const ENV_DEFINITIONS_DIR: &'static str = "ARCADE_DEFINITIONS_DIR";

    /// Load config with layered precedence: file (if present) < env vars
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if config.definitions_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.definitions_dir = parent.join(&config.definitions_dir);
            }
        }
        Ok(config)
    }

    /// Parse and validate config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FactoryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`)
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(Self::ENV_DEFINITIONS_DIR) {
            if !dir.is_empty() {
                self.definitions_dir = PathBuf::from(dir);
            }
        }
    }

    pub fn with_definitions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definitions_dir = dir.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ArcadeError::ConfigError(
                "at least one definition extension is required".to_string(),
            ));
        }
        for ext in &self.extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
                return Err(ArcadeError::ConfigError(format!(
                    "invalid definition extension '{}' (expected e.g. \"rhai\")",
                    ext
                )));
            }
        }
        if self.limits.max_operations == 0 {
            return Err(ArcadeError::ConfigError(
                "limits.max_operations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
