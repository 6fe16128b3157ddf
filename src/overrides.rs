//! Custom resource override.
//!
//! Lets an operator point a namespace at a directory of pre-installed
//! libraries instead of the bundle. The override is advisory: a missing file
//! sends the loader back to extraction.

use std::path::{Path, PathBuf};

use nll_platform::{library_file_name, platform_relative_path, PlatformKey};

use crate::config::{arch_detect_key, path_key, ConfigSource};

/// Result of consulting the override for one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideOutcome {
    /// No override directory configured for the namespace.
    NotConfigured,
    /// The override holds the library at this path.
    Found(PathBuf),
    /// An override is configured but the expected file is absent.
    Missing(PathBuf),
}

/// Override policy over a configuration source.
pub struct CustomResourceOverride<'a> {
    config: &'a dyn ConfigSource,
}

impl<'a> CustomResourceOverride<'a> {
    /// Policy reading its keys from `config`.
    pub fn new(config: &'a dyn ConfigSource) -> Self {
        Self { config }
    }

    /// Configured override directory for `namespace`; empty values count as unset.
    pub fn root(&self, namespace: &str) -> Option<PathBuf> {
        self.config
            .get(&path_key(namespace))
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    /// Whether the override directory keeps the `<os>/<arch>/` layout.
    pub fn arch_detect(&self, namespace: &str) -> bool {
        self.config
            .get(&arch_detect_key(namespace))
            .is_some_and(|value| value.contains("true"))
    }

    /// Where the library would be under the override, without touching disk.
    pub fn candidate(
        &self,
        namespace: &str,
        library: &str,
        platform: &PlatformKey,
    ) -> Option<PathBuf> {
        let root = self.root(namespace)?;
        Some(Self::compose(&root, self.arch_detect(namespace), library, platform))
    }

    /// Consult the override, checking that the candidate is an existing file.
    pub fn resolve(
        &self,
        namespace: &str,
        library: &str,
        platform: &PlatformKey,
    ) -> OverrideOutcome {
        match self.candidate(namespace, library, platform) {
            None => OverrideOutcome::NotConfigured,
            Some(path) if path.is_file() => OverrideOutcome::Found(path),
            Some(path) => OverrideOutcome::Missing(path),
        }
    }

    fn compose(root: &Path, arch_detect: bool, library: &str, platform: &PlatformKey) -> PathBuf {
        if arch_detect {
            platform_relative_path(library, platform)
                .split('/')
                .fold(root.to_path_buf(), |path, segment| path.join(segment))
        } else {
            root.join(library_file_name(library, platform))
        }
    }
}
