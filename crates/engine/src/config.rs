//! Datastore configuration via `dsbridge.toml`
//!
//! A default `dsbridge.toml` can be written next to the application on first
//! start. To change settings, edit the file and restart.

use serde::{Deserialize, Serialize};
use std::path::Path;

use dsbridge_core::{Error, Limits, Result, MAX_BATCH_SIZE, MAX_QUERY_OFFSET};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "dsbridge.toml";

/// Default schema collection
pub const DEFAULT_SCHEMA_COLLECTION: &str = "_schema";

/// Datastore configuration loaded from `dsbridge.toml`.
///
/// # Example
///
/// ```toml
/// app_id = "guestbook"
/// require_indexes = false
/// max_query_offset = 1000
/// max_batch_size = 1000
/// schema_collection = "_schema"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Application the datastore belongs to.
    pub app_id: String,
    /// Fail queries that need an unregistered composite index.
    #[serde(default)]
    pub require_indexes: bool,
    /// Maximum skipped count reported for an offset.
    #[serde(default = "default_max_query_offset")]
    pub max_query_offset: usize,
    /// Maximum number of results per fetch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Collection holding schema records.
    #[serde(default = "default_schema_collection")]
    pub schema_collection: String,
}

fn default_max_query_offset() -> usize {
    MAX_QUERY_OFFSET
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_schema_collection() -> String {
    DEFAULT_SCHEMA_COLLECTION.to_string()
}

impl DatastoreConfig {
    /// Defaults for one application
    pub fn new(app_id: impl Into<String>) -> Self {
        DatastoreConfig {
            app_id: app_id.into(),
            require_indexes: false,
            max_query_offset: MAX_QUERY_OFFSET,
            max_batch_size: MAX_BATCH_SIZE,
            schema_collection: default_schema_collection(),
        }
    }

    /// Enable or disable composite index enforcement
    pub fn require_indexes(mut self, require: bool) -> Self {
        self.require_indexes = require;
        self
    }

    /// Runtime limits derived from this config
    pub fn limits(&self) -> Limits {
        Limits {
            max_query_offset: self.max_query_offset,
            max_batch_size: self.max_batch_size,
        }
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty app id, a zero batch size, or a
    /// schema collection name that does not start with `_`.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("app_id must not be empty".to_string()));
        }
        if self.max_batch_size == 0 {
            return Err(Error::Config("max_batch_size must be at least 1".to_string()));
        }
        if !self.schema_collection.starts_with('_') || self.schema_collection.len() < 2 {
            return Err(Error::Config(format!(
                "schema_collection '{}' must start with '_'",
                self.schema_collection
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# dsbridge datastore configuration
#
# Application id; namespaces nothing today but identifies the datastore.
app_id = "dev"

# Fail queries whose filter/order shape needs a composite index that has
# not been registered (default: false)
require_indexes = false

# Largest skipped count reported for a query offset (default: 1000)
max_query_offset = 1000

# Largest number of results returned per fetch (default: 1000)
max_batch_size = 1000

# Collection holding per-kind schema records (default: "_schema")
schema_collection = "_schema"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DatastoreConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
