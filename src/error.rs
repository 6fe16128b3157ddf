//! Loader error taxonomy.
//!
//! Every failure of `load_library` / `extract_library` surfaces as one of
//! these variants. None are retried internally.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use nll_cache::CacheError;
use nll_platform::PlatformError;
use thiserror::Error;

use crate::config::ConfigError;

/// Loader result type
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors surfaced to callers of the loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid namespace '{0}': expected a dotted identifier like 'com.company.library'")]
    InvalidNamespace(String),

    #[error("unsupported platform: OS '{0}' is not one of windows, linux, solaris, os x")]
    UnsupportedPlatform(String),

    #[error("ARM float ABI detection failed: {reason}")]
    AbiDetectionFailed {
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("bundled resource not found: {0}")]
    ResourceNotFound(String),

    #[error("no usable scratch directory for namespace '{namespace}' after {attempts} attempts")]
    ScratchDirUnavailable {
        namespace: String,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    #[error("loading native library '{library}' from {path} failed: {source}")]
    LibraryLoadFailed {
        library: String,
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<PlatformError> for LoaderError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::UnsupportedPlatform(os) => Self::UnsupportedPlatform(os),
            PlatformError::AbiDetectionFailed { reason, source } => {
                Self::AbiDetectionFailed { reason, source }
            }
        }
    }
}

impl From<CacheError> for LoaderError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::ScratchDirUnavailable {
                namespace,
                attempts,
                source,
            } => Self::ScratchDirUnavailable {
                namespace,
                attempts,
                source,
            },
            CacheError::ResourceNotFound(path) => Self::ResourceNotFound(path),
            CacheError::Io { path, source } => Self::Io { path, source },
            CacheError::Platform(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_errors_map_onto_taxonomy() {
        let resource = "/native/x/linux/amd64/y.so";
        let err: LoaderError = CacheError::ResourceNotFound(resource.into()).into();
        assert!(matches!(err, LoaderError::ResourceNotFound(ref p) if p == resource));

        let err: LoaderError = CacheError::ScratchDirUnavailable {
            namespace: "org.demo".into(),
            attempts: 20,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
        }
        .into();
        assert!(matches!(err, LoaderError::ScratchDirUnavailable { attempts: 20, .. }));
    }

    #[test]
    fn test_platform_errors_map_onto_taxonomy() {
        let err: LoaderError = PlatformError::UnsupportedPlatform("BeOS".into()).into();
        assert!(matches!(err, LoaderError::UnsupportedPlatform(ref os) if os == "BeOS"));

        let nested: LoaderError =
            CacheError::Platform(PlatformError::UnsupportedPlatform("BeOS".into())).into();
        assert!(matches!(nested, LoaderError::UnsupportedPlatform(_)));
    }

    #[test]
    fn test_load_failure_keeps_cause() {
        let err = LoaderError::LibraryLoadFailed {
            library: "fastz".into(),
            path: PathBuf::from("/tmp/fastz.so"),
            source: "undefined symbol: fz_init".into(),
        };
        assert!(err.to_string().contains("undefined symbol: fz_init"));
        assert!(err.source().is_some());
    }
}
