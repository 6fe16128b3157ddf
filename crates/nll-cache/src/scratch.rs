//! Namespace scratch directories.
//!
//! Each namespace gets one exclusively-owned directory under the shared root:
//! `<root>/<namespace-as-path>/<n>`. Cross-process contention is resolved by
//! index rotation rather than file locks: a candidate that cannot be cleared
//! is assumed to belong to another live process and is skipped.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use nll_platform::namespace_segments;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::remove::remove_dir_tree;

/// Name of the root scratch directory inside the system temp directory.
pub const SCRATCH_DIR_NAME: &str = "native_library_loader";

/// Number of candidate indices tried per namespace.
pub const MAX_SCRATCH_ATTEMPTS: usize = 20;

/// `<system temp>/native_library_loader`
pub fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}

/// Scratch directories created by this process, for removal at teardown.
#[derive(Debug, Default)]
pub struct ScratchRegistry {
    dirs: Mutex<Vec<PathBuf>>,
}

impl ScratchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dir` for removal at teardown. Duplicates are ignored.
    pub fn register(&self, dir: PathBuf) {
        let mut dirs = self.lock();
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    /// Directories currently registered, in registration order.
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Remove every registered directory, best-effort.
    ///
    /// Failures are logged and skipped. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        let dirs: Vec<PathBuf> = self.lock().drain(..).collect();

        let mut removed = 0;
        for dir in dirs {
            if !dir.exists() {
                continue;
            }
            match remove_dir_tree(&dir) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "failed to remove scratch directory")
                }
            }
        }
        removed
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deletes a leftover candidate directory.
pub type RemoveFn = fn(&Path) -> io::Result<()>;

/// Per-namespace scratch directories under a shared root.
pub struct ScratchDirs {
    root: PathBuf,
    max_attempts: usize,
    namespaces: DashMap<String, PathBuf>,
    registry: Arc<ScratchRegistry>,
    remove: RemoveFn,
}

impl ScratchDirs {
    /// Scratch directories under `root`. Nothing is created until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_attempts: MAX_SCRATCH_ATTEMPTS,
            namespaces: DashMap::new(),
            registry: Arc::new(ScratchRegistry::new()),
            remove: remove_dir_tree,
        }
    }

    /// Override the number of candidate indices (at least one).
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Record created directories in a shared registry.
    pub fn with_registry(mut self, registry: Arc<ScratchRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the deletion of leftover candidates ([`remove_dir_tree`] by default).
    pub fn with_remover(mut self, remove: RemoveFn) -> Self {
        self.remove = remove;
        self
    }

    /// Shared root; never removed by teardown.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registry every created directory is recorded in.
    pub fn registry(&self) -> Arc<ScratchRegistry> {
        Arc::clone(&self.registry)
    }

    /// `<root>/<namespace-as-path>`, the parent of the indexed candidates.
    pub fn namespace_base(&self, namespace: &str) -> PathBuf {
        namespace_segments(namespace).fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// The namespace's directory, if one was already acquired.
    pub fn get(&self, namespace: &str) -> Option<PathBuf> {
        self.namespaces.get(namespace).map(|dir| dir.clone())
    }

    /// The namespace's directory, creating it on first request.
    ///
    /// Concurrent first requests for the same namespace are serialized;
    /// other namespaces are unaffected.
    pub fn acquire(&self, namespace: &str) -> CacheResult<PathBuf> {
        if let Some(dir) = self.get(namespace) {
            return Ok(dir);
        }

        let dir = self
            .namespaces
            .entry(namespace.to_string())
            .or_try_insert_with(|| self.create(namespace))?
            .clone();
        Ok(dir)
    }

    fn create(&self, namespace: &str) -> CacheResult<PathBuf> {
        let base = self.namespace_base(namespace);
        let mut last_error = None;

        for index in 0..self.max_attempts {
            let candidate = base.join(index.to_string());
            match self.prepare(&candidate) {
                Ok(()) => {
                    debug!(path = %candidate.display(), namespace, "created scratch directory");
                    self.registry.register(candidate.clone());
                    return Ok(candidate);
                }
                Err(e) => {
                    debug!(
                        path = %candidate.display(),
                        error = %e,
                        "scratch directory unusable, trying next index"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(CacheError::ScratchDirUnavailable {
            namespace: namespace.to_string(),
            attempts: self.max_attempts,
            source: last_error
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no candidates tried")),
        })
    }

    /// Clear a leftover candidate, then create it fresh.
    fn prepare(&self, candidate: &Path) -> io::Result<()> {
        if candidate.exists() {
            (self.remove)(candidate)?;
        }
        fs::create_dir_all(candidate)
    }
}

impl fmt::Debug for ScratchDirs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchDirs")
            .field("root", &self.root)
            .field("max_attempts", &self.max_attempts)
            .field("namespaces", &self.namespaces)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_candidate_is_index_zero() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path().join("root"));

        let dir = dirs.acquire("com.acme.codec").unwrap();

        assert_eq!(dir, temp_dir.path().join("root/com/acme/codec/0"));
        assert!(dir.is_dir());
        assert_eq!(dirs.registry().dirs(), vec![dir]);
    }

    #[test]
    fn test_acquire_is_reused_per_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());

        let first = dirs.acquire("org.demo").unwrap();
        fs::write(first.join("marker"), "x").unwrap();
        let second = dirs.acquire("org.demo").unwrap();

        assert_eq!(first, second);
        assert!(second.join("marker").exists());
    }

    #[test]
    fn test_stale_directory_is_cleared() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());
        let stale = dirs.namespace_base("org.demo").join("0");
        fs::create_dir_all(stale.join("nested")).unwrap();
        fs::write(stale.join("nested/old.so"), "old").unwrap();

        let dir = dirs.acquire("org.demo").unwrap();

        assert_eq!(dir, stale);
        assert!(fs::read_dir(&dir).unwrap().next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unusable_candidate_rotates_to_next_index() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());
        let base = dirs.namespace_base("org.demo");
        fs::create_dir_all(&base).unwrap();
        // A dangling link can be neither reused nor created over.
        std::os::unix::fs::symlink(temp_dir.path().join("nowhere"), base.join("0")).unwrap();

        let dir = dirs.acquire("org.demo").unwrap();

        assert_eq!(dir, base.join("1"));
    }

    #[test]
    fn test_exhausted_attempts_fail() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());
        // Namespace base is a plain file, so no candidate below it can exist.
        fs::create_dir_all(temp_dir.path().join("org")).unwrap();
        fs::write(dirs.namespace_base("org.demo"), "not a directory").unwrap();

        match dirs.acquire("org.demo") {
            Err(CacheError::ScratchDirUnavailable { namespace, attempts, .. }) => {
                assert_eq!(namespace, "org.demo");
                assert_eq!(attempts, MAX_SCRATCH_ATTEMPTS);
            }
            other => panic!("expected ScratchDirUnavailable, got {other:?}"),
        }
        assert!(dirs.get("org.demo").is_none());
    }

    /// Refuses to delete a directory holding `held.so`, like a library
    /// mapped by another live process.
    fn refuse_held(path: &Path) -> io::Result<()> {
        if path.join("held.so").exists() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "held.so in use"));
        }
        remove_dir_tree(path)
    }

    fn hold(dirs: &ScratchDirs, namespace: &str, indices: std::ops::Range<usize>) {
        for index in indices {
            let candidate = dirs.namespace_base(namespace).join(index.to_string());
            fs::create_dir_all(&candidate).unwrap();
            fs::write(candidate.join("held.so"), "mapped").unwrap();
        }
    }

    #[test]
    fn test_undeletable_candidates_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path())
            .with_max_attempts(3)
            .with_remover(refuse_held);
        hold(&dirs, "org.demo", 0..2);

        let dir = dirs.acquire("org.demo").unwrap();

        assert_eq!(dir, dirs.namespace_base("org.demo").join("2"));
        assert!(dirs.namespace_base("org.demo").join("0/held.so").exists());
        assert!(dirs.namespace_base("org.demo").join("1/held.so").exists());
        assert_eq!(dirs.registry().dirs(), vec![dir]);
    }

    #[test]
    fn test_all_candidates_undeletable_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path())
            .with_max_attempts(3)
            .with_remover(refuse_held);
        hold(&dirs, "org.demo", 0..3);

        match dirs.acquire("org.demo") {
            Err(CacheError::ScratchDirUnavailable { attempts, source, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected ScratchDirUnavailable, got {other:?}"),
        }
        assert!(dirs.registry().dirs().is_empty());
    }

    #[test]
    fn test_all_default_candidates_undeletable_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path()).with_remover(refuse_held);
        hold(&dirs, "org.demo", 0..MAX_SCRATCH_ATTEMPTS);

        assert!(matches!(
            dirs.acquire("org.demo"),
            Err(CacheError::ScratchDirUnavailable { attempts: MAX_SCRATCH_ATTEMPTS, .. })
        ));
    }

    // Read-only parents block deletion only for unprivileged users; the test
    // returns early where the permission bits are not enforced.
    #[cfg(unix)]
    #[test]
    fn test_read_only_candidate_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path()).with_max_attempts(2);
        let locked = dirs.namespace_base("org.demo").join("0");
        let inner = locked.join("lib");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("held.so"), "mapped").unwrap();
        fs::set_permissions(&inner, fs::Permissions::from_mode(0o555)).unwrap();

        let enforced = fs::write(inner.join("write-check"), "x").is_err();
        let result = if enforced { Some(dirs.acquire("org.demo")) } else { None };
        fs::set_permissions(&inner, fs::Permissions::from_mode(0o755)).unwrap();

        let Some(result) = result else {
            return;
        };
        assert_eq!(result.unwrap(), dirs.namespace_base("org.demo").join("1"));
        assert!(inner.join("held.so").exists());
    }

    #[test]
    fn test_registry_survives_poisoning() {
        let registry = Arc::new(ScratchRegistry::new());
        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.dirs.lock().unwrap();
            panic!("poison the registry");
        })
        .join();
        assert!(registry.dirs.is_poisoned());

        registry.register(PathBuf::from("/tmp/native_library_loader/org/demo/0"));

        assert_eq!(registry.dirs().len(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());

        let a = dirs.acquire("com.acme").unwrap();
        let b = dirs.acquire("com.acme.codec").unwrap();

        assert_ne!(a, b);
        assert_eq!(a, temp_dir.path().join("com/acme/0"));
        assert_eq!(b, temp_dir.path().join("com/acme/codec/0"));
    }

    #[test]
    fn test_registry_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = ScratchDirs::new(temp_dir.path());
        let dir = dirs.acquire("org.demo").unwrap();
        fs::write(dir.join("lib.so"), "bytes").unwrap();

        assert_eq!(dirs.registry().cleanup(), 1);
        assert!(!dir.exists());
        assert!(dirs.registry().dirs().is_empty());
        assert!(temp_dir.path().exists());
    }
}
