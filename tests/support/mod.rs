//! Shared fakes for loader integration tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use native_library_loader::{
    DynamicLoader, EmbeddedResources, LoadFailure, LoaderBuilder, MapConfig, NativeLibraryLoader,
    OsFamily, PlatformKey, ResourceProvider, ResourceReader,
};

pub const NS: &str = "com.acme.codec";
pub const LIB: &str = "fastz";
pub const FASTZ_LINUX_AMD64: &str = "/native/com/acme/codec/linux/amd64/fastz.so";
pub const FASTZ_BYTES: &[u8] = b"\x7fELF fastz linux amd64";

pub fn linux_amd64() -> PlatformKey {
    PlatformKey::new(OsFamily::Linux, "amd64")
}

/// Records every path handed to it instead of loading anything.
#[derive(Clone, Default)]
pub struct RecordingLoader {
    loads: Arc<Mutex<Vec<PathBuf>>>,
    fail_with: Option<String>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader whose every load fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            loads: Arc::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().unwrap().clone()
    }
}

impl DynamicLoader for RecordingLoader {
    fn load(&self, path: &Path) -> Result<(), LoadFailure> {
        self.loads.lock().unwrap().push(path.to_path_buf());
        match &self.fail_with {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

/// Embedded resources that count how often they are opened.
#[derive(Clone)]
pub struct CountingResources {
    inner: Arc<EmbeddedResources>,
    opens: Arc<AtomicUsize>,
}

impl CountingResources {
    pub fn new(inner: EmbeddedResources) -> Self {
        Self {
            inner: Arc::new(inner),
            opens: Arc::default(),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ResourceProvider for CountingResources {
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(path)
    }
}

pub fn fastz_bundle() -> CountingResources {
    CountingResources::new(EmbeddedResources::new().with(FASTZ_LINUX_AMD64, FASTZ_BYTES.to_vec()))
}

/// Loader on Linux/amd64 with a scratch root inside `temp_dir` and no
/// operator configuration.
pub fn linux_loader(temp_dir: &TempDir) -> LoaderBuilder {
    NativeLibraryLoader::builder()
        .scratch_root(temp_dir.path().join("scratch"))
        .os_name("Linux")
        .arch_name("amd64")
        .config(MapConfig::new())
}
