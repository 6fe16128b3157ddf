//! Dynamic-loading primitive.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use libloading::Library;
use tracing::debug;

/// Failure reported by a [`DynamicLoader`].
pub type LoadFailure = Box<dyn StdError + Send + Sync>;

/// Makes a library file's code available to the process.
pub trait DynamicLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<(), LoadFailure>;
}

/// Loads libraries with the platform linker via `libloading`.
///
/// On Unix libraries are opened `RTLD_NOW | RTLD_GLOBAL` so their symbols
/// resolve for libraries loaded afterwards. Handles are kept until the loader
/// is dropped; a path already loaded is not opened again.
#[derive(Debug, Default)]
pub struct SystemLoader {
    handles: Mutex<HashMap<PathBuf, Library>>,
}

impl SystemLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of libraries held open.
    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    /// Whether `path` was loaded through this loader.
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.handles().contains_key(path)
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<PathBuf, Library>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DynamicLoader for SystemLoader {
    fn load(&self, path: &Path) -> Result<(), LoadFailure> {
        let mut handles = self.handles();
        if handles.contains_key(path) {
            debug!(path = %path.display(), "library already loaded");
            return Ok(());
        }

        // SAFETY: running a library's initializers is inherent to loading it;
        // callers only hand over libraries they chose to trust.
        let library = unsafe { open(path) }?;
        handles.insert(path.to_path_buf(), library);
        Ok(())
    }
}

#[cfg(unix)]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL).map(Library::from)
}

#[cfg(not(unix))]
unsafe fn open(path: &Path) -> Result<Library, libloading::Error> {
    Library::new(path)
}
