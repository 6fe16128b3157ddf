//! Layered configuration with provenance.

use std::fmt;

use super::{ConfigSource, EnvConfig};

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Explicit,
    Env,
    File,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Env => write!(f, "env"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Ordered stack of sources; earlier layers take precedence.
#[derive(Default)]
pub struct LayeredConfig {
    layers: Vec<(ConfigOrigin, Box<dyn ConfigSource>)>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the process environment.
    pub fn from_env() -> Self {
        Self::new().with_layer(ConfigOrigin::Env, EnvConfig)
    }

    /// Append a layer with lower precedence than the existing ones.
    pub fn with_layer(mut self, origin: ConfigOrigin, source: impl ConfigSource + 'static) -> Self {
        self.layers.push((origin, Box::new(source)));
        self
    }

    /// Value and origin of `key` from the first layer that has it.
    pub fn lookup(&self, key: &str) -> Option<(String, ConfigOrigin)> {
        self.layers
            .iter()
            .find_map(|(origin, source)| source.get(key).map(|value| (value, *origin)))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigSource for LayeredConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(value, _)| value)
    }
}

impl fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origins: Vec<ConfigOrigin> = self.layers.iter().map(|(origin, _)| *origin).collect();
        f.debug_struct("LayeredConfig").field("layers", &origins).finish()
    }
}
