//! Builder-level loader settings.

use std::path::PathBuf;

use nll_cache::{default_scratch_root, MAX_SCRATCH_ATTEMPTS};

/// Settings fixed when a loader is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Root under which per-namespace scratch directories are created.
    pub scratch_root: PathBuf,
    /// Candidate scratch indices tried per namespace.
    pub max_scratch_attempts: usize,
    /// Raw OS name to resolve instead of the host's.
    pub os_name: Option<String>,
    /// Raw architecture name to resolve instead of the host's.
    pub arch_name: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            scratch_root: default_scratch_root(),
            max_scratch_attempts: MAX_SCRATCH_ATTEMPTS,
            os_name: None,
            arch_name: None,
        }
    }
}
