//! Resolved platform identity used for resource lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arch::{resolve_architecture, AbiProbe};
use crate::error::PlatformResult;
use crate::os::{resolve_os, OsFamily};

/// Canonical (OS family, architecture) pair selecting a binary variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    /// Operating-system family
    pub os: OsFamily,
    /// Lowercase architecture token (e.g. "amd64", "armhf")
    pub arch: String,
}

impl PlatformKey {
    /// Create a key from an already-resolved family and architecture.
    ///
    /// The architecture is lowercased.
    pub fn new(os: OsFamily, arch: &str) -> Self {
        Self {
            os,
            arch: arch.to_lowercase(),
        }
    }

    /// Library file extension for this platform.
    pub fn library_extension(&self) -> &'static str {
        self.os.library_extension()
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.dir_name(), self.arch)
    }
}

/// Resolve raw OS and architecture names into a [`PlatformKey`].
///
/// The OS is checked first, so an unsupported OS fails without running the
/// ABI probe.
pub fn resolve_platform(
    raw_os: &str,
    raw_arch: &str,
    probe: &dyn AbiProbe,
) -> PlatformResult<PlatformKey> {
    let os = resolve_os(raw_os)?;
    let arch = resolve_architecture(raw_arch, probe)?;

    info!(os = raw_os, arch = %arch, "resolved platform");
    Ok(PlatformKey { os, arch })
}
