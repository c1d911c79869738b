//! Mapper configuration.
//!
//! Configuration names the database and collection documents live in and the
//! acknowledgement mode writes are issued with. It is read once when a
//! [`Mapper`](crate::document::Mapper) is built and reused for every document
//! that mapper hands out.
//!
//! ```
//! use docmapper::config::{Durability, MapperConfig};
//!
//! let config = MapperConfig::from_json_str(
//!     r#"{"database": "blog", "collection": "posts", "durability": "journaled"}"#,
//! ).unwrap();
//!
//! assert_eq!(config.namespace().to_string(), "blog.posts");
//! assert_eq!(config.durability, Durability::Journaled);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Result;
use crate::backend::Namespace;
use crate::constants::{
    DEFAULT_COLLECTION, DEFAULT_DATABASE, ENV_COLLECTION, ENV_DATABASE, ENV_DURABILITY,
};

/// Errors raised while loading configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read config file {path}")]
    FileRead {
        /// The file that failed to load
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid.
    #[error("Failed to parse config")]
    Parse {
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Unrecognised durability mode name.
    #[error("Invalid durability mode '{value}'")]
    InvalidDurability {
        /// The rejected value
        value: String,
    },
}

impl ConfigError {
    /// Check if this error came from reading a file
    pub fn is_io_error(&self) -> bool {
        matches!(self, ConfigError::FileRead { .. })
    }

    /// Check if this error came from malformed input
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConfigError::Parse { .. } | ConfigError::InvalidDurability { .. }
        )
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// How strongly the backend must acknowledge a write before it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Fire and forget
    Unacknowledged,
    /// Acknowledged by the primary
    #[default]
    Acknowledged,
    /// Acknowledged after reaching the journal
    Journaled,
    /// Acknowledged by a majority of replicas
    Majority,
}

impl FromStr for Durability {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unacknowledged" => Ok(Durability::Unacknowledged),
            "acknowledged" => Ok(Durability::Acknowledged),
            "journaled" => Ok(Durability::Journaled),
            "majority" => Ok(Durability::Majority),
            _ => Err(ConfigError::InvalidDurability {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Durability::Unacknowledged => "unacknowledged",
            Durability::Acknowledged => "acknowledged",
            Durability::Journaled => "journaled",
            Durability::Majority => "majority",
        };
        write!(f, "{name}")
    }
}

/// Where documents live and how writes are acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Database name
    pub database: String,
    /// Collection name
    pub collection: String,
    /// Write acknowledgement mode
    pub durability: Durability,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            durability: Durability::default(),
        }
    }
}

impl MapperConfig {
    /// Creates a config for the given database and collection
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            durability: Durability::default(),
        }
    }

    /// Sets the durability mode
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// The namespace documents are stored under
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database, &self.collection)
    }

    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse { source }.into())
    }

    /// Loads a JSON config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Applies `DOCMAPPER_DATABASE`, `DOCMAPPER_COLLECTION` and
    /// `DOCMAPPER_DURABILITY` from the environment, when set.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup (see
    /// [`MapperConfig::with_env_overrides`]).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = database;
        }
        if let Some(collection) = lookup(ENV_COLLECTION) {
            self.collection = collection;
        }
        if let Some(durability) = lookup(ENV_DURABILITY) {
            self.durability = durability.parse()?;
        }
        tracing::debug!(
            database = %self.database,
            collection = %self.collection,
            durability = %self.durability,
            "Resolved mapper configuration"
        );
        Ok(self)
    }
}
