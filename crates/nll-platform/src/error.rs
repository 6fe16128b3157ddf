//! Platform resolution errors.

use std::io;

use thiserror::Error;

/// Platform result type
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors from resolving the running platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS string matched none of the known families.
    #[error("unsupported platform: OS '{0}' is not one of windows, linux, solaris, os x")]
    UnsupportedPlatform(String),

    /// ARM float ABI could not be determined.
    #[error("ARM float ABI detection failed: {reason}")]
    AbiDetectionFailed {
        reason: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl PlatformError {
    pub(crate) fn abi(reason: impl Into<String>) -> Self {
        Self::AbiDetectionFailed {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn abi_io(reason: impl Into<String>, source: io::Error) -> Self {
        Self::AbiDetectionFailed {
            reason: reason.into(),
            source: Some(source),
        }
    }
}
