//! YAML configuration for the API server.
//!
//! Configuration lives in `config.<id>.yaml` files under the configuration
//! directory. Each file is a [`ConfigurationDefinition`]; the API reads the
//! one with id `api` (`config.api.yaml`).

use relay::PaginationLimits;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const API_CONFIG_FILE: &str = "config.api.yaml";

pub const DEFAULT_PORT: u16 = 3030;
pub const TODOS_LIMITS: PaginationLimits = PaginationLimits::new(50, 50);
pub const USERS_LIMITS: PaginationLimits = PaginationLimits::new(30, 30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// One configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDefinition {
    /// Unique identifier, e.g. `api`
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The crate that reads this configuration
    pub provider: String,
    pub version: String,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl ConfigurationDefinition {
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let definition: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::Validation(
                "Configuration ID cannot be empty".to_string(),
            ));
        }
        if self.provider.is_empty() {
            return Err(ConfigError::Validation(
                "Configuration provider cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Looks up a value by dotted path, e.g. `pagination.todos.first_max`.
    pub fn get_nested(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }
}

/// Loads every `config.*.yaml` in `dir`, sorted by id.
///
/// A missing directory yields no definitions. Files that fail to parse or
/// validate are skipped with a warning.
pub fn load_definitions(dir: &Path) -> Result<Vec<ConfigurationDefinition>, ConfigError> {
    let mut definitions = Vec::new();

    if !dir.exists() {
        debug!("Configuration directory {:?} does not exist", dir);
        return Ok(definitions);
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let is_config = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.starts_with("config."));
        if !is_yaml || !is_config {
            continue;
        }

        match ConfigurationDefinition::from_file(&path) {
            Ok(definition) => {
                info!("Loaded configuration from {:?}", path);
                definitions.push(definition);
            }
            Err(e) => warn!("Skipping configuration {:?}: {}", path, e),
        }
    }

    definitions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(definitions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub todos: PaginationLimits,
    pub users: PaginationLimits,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            todos: TODOS_LIMITS,
            users: USERS_LIMITS,
        }
    }
}

/// The list fields with their own pagination limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Todos,
    Users,
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to seed development data on startup
    pub init_test_data: bool,
    pub pagination: PaginationConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            #[cfg(debug_assertions)]
            init_test_data: true,
            #[cfg(not(debug_assertions))]
            init_test_data: false,
            pagination: PaginationConfig::default(),
        }
    }
}

/// The `values` of `config.api.yaml`; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
struct ApiValues {
    port: Option<u16>,
    init_test_data: Option<bool>,
    pagination: Option<PaginationValues>,
}

#[derive(Debug, Default, Deserialize)]
struct PaginationValues {
    todos: Option<PaginationLimits>,
    users: Option<PaginationLimits>,
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_test_data(mut self, init: bool) -> Self {
        self.init_test_data = init;
        self
    }

    pub fn with_limits(mut self, field: ListField, limits: PaginationLimits) -> Self {
        match field {
            ListField::Todos => self.pagination.todos = limits,
            ListField::Users => self.pagination.users = limits,
        }
        self
    }

    pub fn limits(&self, field: ListField) -> PaginationLimits {
        match field {
            ListField::Todos => self.pagination.todos,
            ListField::Users => self.pagination.users,
        }
    }

    /// Applies the values of an `api` configuration definition over the
    /// defaults.
    pub fn from_definition(definition: &ConfigurationDefinition) -> Result<Self, ConfigError> {
        let mapping: serde_yaml::Mapping = definition
            .values
            .iter()
            .map(|(key, value)| (Value::String(key.clone()), value.clone()))
            .collect();
        let values: ApiValues =
            serde_yaml::from_value(Value::Mapping(mapping)).map_err(|e| {
                ConfigError::Validation(format!("invalid api configuration: {e}"))
            })?;

        let mut config = Self::default();
        if let Some(port) = values.port {
            config.port = port;
        }
        if let Some(init) = values.init_test_data {
            config.init_test_data = init;
        }
        if let Some(pagination) = values.pagination {
            if let Some(todos) = pagination.todos {
                config.pagination.todos = todos;
            }
            if let Some(users) = pagination.users {
                config.pagination.users = users;
            }
        }
        Ok(config)
    }

    /// Reads `config.api.yaml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(API_CONFIG_FILE);
        if !path.exists() {
            info!("No {} in {:?}, using defaults", API_CONFIG_FILE, dir);
            return Ok(Self::default());
        }
        let definition = ConfigurationDefinition::from_file(&path)?;
        Self::from_definition(&definition)
    }
}
