//! Operating-system families and their library extensions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

/// Supported operating-system families.
///
/// The set is closed: a raw OS string that maps to none of these is a
/// configuration error, there is no generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Windows,
    Linux,
    #[serde(rename = "macos")]
    MacOS,
    Solaris,
}

impl OsFamily {
    /// Resolution order; the first family whose marker occurs in the raw
    /// OS string wins.
    pub const ALL: [OsFamily; 4] = [Self::Windows, Self::Linux, Self::Solaris, Self::MacOS];

    /// Directory name used in the bundled resource layout.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOS => "os x",
            Self::Solaris => "solaris",
        }
    }

    /// File extension of a native library on this family.
    pub fn library_extension(&self) -> &'static str {
        match self {
            Self::Windows => "dll",
            Self::Linux | Self::Solaris => "so",
            Self::MacOS => "jnilib",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Resolve a raw OS name (e.g. "Windows 10", "Mac OS X") to its family.
///
/// Matching is a case-insensitive substring test against each family's
/// directory name.
pub fn resolve_os(raw_os: &str) -> PlatformResult<OsFamily> {
    let lowered = raw_os.to_lowercase();
    OsFamily::ALL
        .into_iter()
        .find(|family| lowered.contains(family.dir_name()))
        .ok_or_else(|| PlatformError::UnsupportedPlatform(raw_os.to_string()))
}
