//! Concrete configuration sources.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{ConfigError, ConfigSource};

/// Process environment.
///
/// A key is looked up verbatim first, then in upper snake case with dots
/// turned into underscores, since most shells reject dots in variable names:
/// `native_library_loader_com.acme_path` → `NATIVE_LIBRARY_LOADER_COM_ACME_PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    /// Upper snake case form of `key`.
    pub fn shell_name(key: &str) -> String {
        key.replace('.', "_").to_uppercase()
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| std::env::var(Self::shell_name(key)).ok())
    }
}

/// In-memory values.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: BTreeMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Flat TOML table of string or boolean values.
///
/// ```toml
/// "native_library_loader_com.acme.codec_path" = "/opt/acme/native"
/// "native_library_loader_com.acme.codec_arch_detect" = true
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlConfig {
    values: BTreeMap<String, String>,
}

impl TomlConfig {
    /// Read and parse the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table: toml::Table = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_table(table)
    }

    /// Values from an already parsed table; nested tables, arrays and numbers
    /// are rejected.
    pub fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
        let mut values = BTreeMap::new();
        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Boolean(b) => b.to_string(),
                _ => return Err(ConfigError::UnsupportedValue { key }),
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }
}

impl ConfigSource for TomlConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
