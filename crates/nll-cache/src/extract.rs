//! Extraction of bundled libraries into scratch directories.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use nll_platform::{build_resource_path, library_file_name, PlatformKey};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::key::LibraryKey;
use crate::resources::ResourceProvider;
use crate::scratch::ScratchDirs;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Extraction cache.
///
/// Maps each [`LibraryKey`] to the local file it was extracted to. Entries
/// are created once and never invalidated; lookups and insertions are safe
/// from any thread.
pub struct ExtractionCache {
    scratch: ScratchDirs,
    resources: Arc<dyn ResourceProvider>,
    extracted: DashMap<LibraryKey, PathBuf>,
}

impl ExtractionCache {
    /// Empty cache extracting from `resources` into `scratch`.
    pub fn new(scratch: ScratchDirs, resources: Arc<dyn ResourceProvider>) -> Self {
        Self {
            scratch,
            resources,
            extracted: DashMap::new(),
        }
    }

    /// Scratch directories the cache extracts into.
    pub fn scratch(&self) -> &ScratchDirs {
        &self.scratch
    }

    /// Path of a previously extracted library, without any I/O.
    pub fn cached(&self, key: &LibraryKey) -> Option<PathBuf> {
        self.extracted.get(key).map(|path| path.clone())
    }

    /// Number of extracted libraries.
    pub fn len(&self) -> usize {
        self.extracted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty()
    }

    /// Extract `key` for `platform`, or return the earlier result.
    ///
    /// Layout: `<scratch root>/<namespace-as-path>/<n>/<library>.<ext>`
    pub fn extract(&self, key: &LibraryKey, platform: &PlatformKey) -> CacheResult<PathBuf> {
        if let Some(path) = self.cached(key) {
            return Ok(path);
        }

        let dir = self.scratch.acquire(&key.namespace)?;

        let resource_path = build_resource_path(&key.namespace, &key.library, platform);
        debug!(library = %key, resource = %resource_path, "extracting native library");

        let mut reader = self
            .resources
            .open(&resource_path)
            .map_err(|e| CacheError::io(&resource_path, e))?
            .ok_or_else(|| CacheError::ResourceNotFound(resource_path.clone()))?;

        let target = dir.join(library_file_name(&key.library, platform));
        Self::write_atomic(&target, &mut reader)?;

        debug!(library = %key, path = %target.display(), "native library extracted");

        let path = self
            .extracted
            .entry(key.clone())
            .or_insert(target)
            .clone();
        Ok(path)
    }

    /// Copy `reader` into a sibling temp file, then rename it over `target`.
    fn write_atomic(target: &Path, reader: &mut dyn io::Read) -> CacheResult<()> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = target.with_file_name(format!(
            ".tmp.{}.{}.{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            file_name
        ));

        let written = (|| -> io::Result<()> {
            let mut temp_file = File::create(&temp_path)?;
            io::copy(reader, &mut temp_file)?;
            temp_file.flush()?;
            temp_file.sync_all()
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&temp_path, e));
        }

        fs::rename(&temp_path, target).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CacheError::io(target, e)
        })
    }
}

impl std::fmt::Debug for ExtractionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionCache")
            .field("scratch", &self.scratch)
            .field("extracted", &self.extracted.len())
            .finish()
    }
}
