//! Lookup configuration.
//!
//! Loaded from a TOML file; every field except the keys data directory has
//! a default.
//!
//! ```toml
//! keys_data_directory = "keys_data/GMO"
//! admin_key_policy = "fold_case"
//!
//! [batch]
//! concurrency = 4
//! chunk_size = 500
//! ```

use std::path::{Path, PathBuf};

use quake_keys_area_peril::KeyPolicy;
use serde::Deserialize;

use crate::LookupError;

/// Keys lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    /// Directory holding the catalog and vulnerability dictionary.
    pub keys_data_directory: PathBuf,
    /// Catalog file name, relative to the keys data directory.
    #[serde(default = "default_areaperil_file")]
    pub areaperil_file: String,
    /// Vulnerability dictionary file name, relative to the keys data
    /// directory.
    #[serde(default = "default_vulnerability_file")]
    pub vulnerability_file: String,
    /// Model supplier.
    #[serde(default = "default_supplier")]
    pub supplier: String,
    /// Model name.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Model version.
    #[serde(default)]
    pub model_version: Option<String>,
    /// County/state name matching policy.
    #[serde(default)]
    pub admin_key_policy: KeyPolicy,
    /// Concurrent batch settings.
    #[serde(default)]
    pub batch: BatchOptions,
}

/// Settings for [`crate::KeysLookup::resolve_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchOptions {
    /// Maximum number of chunks resolved at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Locations per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_areaperil_file() -> String {
    "areaperil_dict.csv".to_string()
}

fn default_vulnerability_file() -> String {
    "vulnerability_dict.csv".to_string()
}

fn default_supplier() -> String {
    "GEMFoundation".to_string()
}

fn default_model_name() -> String {
    "GMO".to_string()
}

const fn default_concurrency() -> usize {
    4
}

const fn default_chunk_size() -> usize {
    1000
}

impl LookupConfig {
    /// Creates a configuration with defaults for the given directory.
    #[must_use]
    pub fn new(keys_data_directory: impl Into<PathBuf>) -> Self {
        Self {
            keys_data_directory: keys_data_directory.into(),
            areaperil_file: default_areaperil_file(),
            vulnerability_file: default_vulnerability_file(),
            supplier: default_supplier(),
            model_name: default_model_name(),
            model_version: None,
            admin_key_policy: KeyPolicy::default(),
            batch: BatchOptions::default(),
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] if the text is not a valid config.
    pub fn from_toml_str(text: &str) -> Result<Self, LookupError> {
        toml::de::from_str(text).map_err(|e| LookupError::Config(e.to_string()))
    }

    /// Reads a configuration file.
    ///
    /// Relative `keys_data_directory` paths are resolved against the
    /// directory containing the config file.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let text = std::fs::read_to_string(path).map_err(|e| LookupError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.keys_data_directory.is_relative()
            && let Some(parent) = path.parent()
        {
            config.keys_data_directory = parent.join(&config.keys_data_directory);
        }
        log::debug!("Loaded lookup config from {}", path.display());
        Ok(config)
    }

    /// Full path of the catalog file.
    #[must_use]
    pub fn areaperil_path(&self) -> PathBuf {
        self.keys_data_directory.join(&self.areaperil_file)
    }

    /// Full path of the vulnerability dictionary.
    #[must_use]
    pub fn vulnerability_path(&self) -> PathBuf {
        self.keys_data_directory.join(&self.vulnerability_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = LookupConfig::from_toml_str("keys_data_directory = \"/data/gmo\"").unwrap();
        assert_eq!(config.areaperil_path(), Path::new("/data/gmo/areaperil_dict.csv"));
        assert_eq!(
            config.vulnerability_path(),
            Path::new("/data/gmo/vulnerability_dict.csv")
        );
        assert_eq!(config.supplier, "GEMFoundation");
        assert_eq!(config.model_name, "GMO");
        assert_eq!(config.model_version, None);
        assert_eq!(config.admin_key_policy, KeyPolicy::Exact);
        assert_eq!(config.batch, BatchOptions::default());
    }

    #[test]
    fn overrides_are_honored() {
        let text = r#"
keys_data_directory = "/data"
areaperil_file = "cells.csv"
model_version = "0.2"
admin_key_policy = "fold_case"

[batch]
chunk_size = 10
"#;
        let config = LookupConfig::from_toml_str(text).unwrap();
        assert_eq!(config.areaperil_path(), Path::new("/data/cells.csv"));
        assert_eq!(config.model_version.as_deref(), Some("0.2"));
        assert_eq!(config.admin_key_policy, KeyPolicy::FoldCase);
        assert_eq!(config.batch.chunk_size, 10);
        assert_eq!(config.batch.concurrency, 4);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let text = "keys_data_directory = \"/d\"\nadmin_key_policy = \"fuzzy\"";
        assert!(matches!(
            LookupConfig::from_toml_str(text),
            Err(LookupError::Config(_))
        ));
    }

    #[test]
    fn relative_directory_resolves_against_config_file() {
        let dir = std::env::temp_dir().join("quake_keys_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lookup.toml");
        std::fs::write(&path, "keys_data_directory = \"keys\"").unwrap();

        let config = LookupConfig::load(&path).unwrap();
        assert_eq!(config.keys_data_directory, dir.join("keys"));
    }
}
