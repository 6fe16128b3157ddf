//! Loader configuration
//!
//! Operator settings are flat string key/value pairs, looked up through a
//! [`ConfigSource`]. Recognized keys, per namespace:
//!
//! | Key | Meaning |
//! |---|---|
//! | `native_library_loader_<namespace>_path` | Directory holding pre-installed libraries |
//! | `native_library_loader_<namespace>_arch_detect` | `true`: directory uses `<os>/<arch>/` |
//!
//! Sources are layered; the first layer that has a key wins:
//! 1. Explicit values set by the embedding program
//! 2. Process environment
//! 3. TOML file named by `NATIVE_LIBRARY_LOADER_CONFIG`

mod layered;
mod settings;
mod sources;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use layered::{ConfigOrigin, LayeredConfig};
pub use settings::LoaderConfig;
pub use sources::{EnvConfig, MapConfig, TomlConfig};

/// Prefix shared by all loader configuration keys.
pub const PROPERTY_PREFIX: &str = "native_library_loader";

/// Environment variable naming an optional TOML file read by
/// `NativeLibraryLoader::from_env`.
pub const CONFIG_FILE_ENV: &str = "NATIVE_LIBRARY_LOADER_CONFIG";

/// Key naming the custom resource directory for `namespace`.
pub fn path_key(namespace: &str) -> String {
    format!("{PROPERTY_PREFIX}_{namespace}_path")
}

/// Key enabling `<os>/<arch>/` resolution under the custom directory.
pub fn arch_detect_key(namespace: &str) -> String {
    format!("{PROPERTY_PREFIX}_{namespace}_arch_detect")
}

/// Key/value configuration lookup.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Errors from loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config value for '{key}' must be a string or boolean")]
    UnsupportedValue { key: String },
}
