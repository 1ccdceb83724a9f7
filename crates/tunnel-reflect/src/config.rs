//! Accessor cache configuration, loaded from the `[reflect]` table of a TOML
//! document.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration for an [`AccessorCache`](crate::AccessorCache)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectConfig {
    /// Maximum number of classes visited per hierarchy walk (default: 64).
    /// Lookups on a type with a longer superclass chain fail with
    /// [`ReflectError::HierarchyTooDeep`](crate::ReflectError::HierarchyTooDeep).
    pub max_hierarchy_depth: usize,
    /// Store resolved handles (default: true). When false every access
    /// resolves again, which helps when debugging descriptor registration.
    pub memoize: bool,
}

impl Default for ReflectConfig {
    fn default() -> Self {
        ReflectConfig {
            max_hierarchy_depth: 64,
            memoize: true,
        }
    }
}

/// Errors loading a [`ReflectConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid
    #[error("invalid reflect config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    reflect: ReflectConfig,
}

impl ReflectConfig {
    /// Parse the `[reflect]` table of a TOML document. A missing table
    /// yields the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(source)?;
        Ok(document.reflect)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
