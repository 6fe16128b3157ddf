//! Bundled resource providers.
//!
//! A provider maps a lookup path such as
//! `/native/com/acme/codec/linux/amd64/fastz.so` to a byte stream. An absent
//! resource is `Ok(None)`, kept apart from I/O failures.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tar::Archive;

/// Byte stream of one bundled resource.
pub type ResourceReader = Box<dyn Read + Send>;

/// Source of bundled native library bytes.
pub trait ResourceProvider: Send + Sync {
    /// Open the resource at `path`, or `Ok(None)` if the bundle has none.
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>>;
}

impl<T: ResourceProvider + ?Sized> ResourceProvider for Arc<T> {
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>> {
        (**self).open(path)
    }
}

/// Lookup path as relative segments; `None` if it tries to climb out.
fn relative_segments(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.is_empty() || segments.contains(&"..") {
        return None;
    }
    Some(segments)
}

/// Resources unpacked into a directory tree; `/native/...` resolves to
/// `<root>/native/...`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Resources under `root`, which holds the `native/` tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory lookup paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceProvider for DirectoryResources {
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>> {
        let Some(segments) = relative_segments(path) else {
            return Ok(None);
        };
        let file_path = segments.iter().fold(self.root.clone(), |p, s| p.join(s));

        match File::open(&file_path) {
            Ok(file) if file.metadata()?.is_file() => Ok(Some(Box::new(BufReader::new(file)))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Resources held in memory, typically from `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, Arc<[u8]>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource at `path` (leading slash included).
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Add or replace the resource at `path`.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceProvider for EmbeddedResources {
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>> {
        Ok(self
            .entries
            .get(path)
            .map(|bytes| Box::new(Cursor::new(Arc::clone(bytes))) as ResourceReader))
    }
}

/// Resources inside a tar archive on disk.
///
/// The archive is scanned on every open; extraction happens once per
/// library, so no index is kept.
#[derive(Debug, Clone)]
pub struct TarResources {
    archive_path: PathBuf,
}

impl TarResources {
    /// Resources inside the tar file at `archive_path`; it is opened lazily.
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

impl ResourceProvider for TarResources {
    fn open(&self, path: &str) -> io::Result<Option<ResourceReader>> {
        let Some(wanted) = relative_segments(path) else {
            return Ok(None);
        };

        let file = File::open(&self.archive_path)?;
        let mut archive = Archive::new(BufReader::new(file));

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry.path()?.to_string_lossy().into_owned();
            if relative_segments(&entry_path).as_deref() != Some(wanted.as_slice()) {
                continue;
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            return Ok(Some(Box::new(Cursor::new(bytes))));
        }

        Ok(None)
    }
}
