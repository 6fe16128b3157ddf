//! Extraction cache errors.

use std::io;
use std::path::PathBuf;

use nll_platform::PlatformError;
use thiserror::Error;

/// Cache result type
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from extraction cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no usable scratch directory for namespace '{namespace}' after {attempts} attempts")]
    ScratchDirUnavailable {
        namespace: String,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    #[error("bundled resource not found: {0}")]
    ResourceNotFound(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
