//! Configuration schema (requel.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// SQL dialect configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// PostgreSQL SQL dialect
    Postgres,

    /// MySQL SQL dialect
    MySql,

    /// SQLite SQL dialect
    Sqlite,

    /// BigQuery SQL dialect
    BigQuery,

    /// Generic ANSI SQL
    Ansi,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::Postgres
    }
}

/// Naming of the generated binding declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsConfig {
    /// Name of the interface holding query parameters
    #[serde(default = "default_input_interface")]
    pub input_interface: String,

    /// Name of the interface describing one returned row
    #[serde(default = "default_result_interface")]
    pub result_interface: String,
}

fn default_input_interface() -> String {
    "Input".to_string()
}

fn default_result_interface() -> String {
    "Result".to_string()
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            input_interface: default_input_interface(),
            result_interface: default_result_interface(),
        }
    }
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL dialect
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Schema file (JSON or TOML)
    #[serde(default = "default_schema_path")]
    pub schema: PathBuf,

    /// Files or directories scanned for `.sql` files
    #[serde(default = "default_sources")]
    pub sources: Vec<PathBuf>,

    /// Output directory for declarations; next to each SQL file when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// Binding naming
    #[serde(default)]
    pub bindings: BindingsConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            schema: default_schema_path(),
            sources: default_sources(),
            out_dir: None,
            bindings: BindingsConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn schema_path(&self) -> PathBuf {
        self.resolve_path(&self.schema)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
