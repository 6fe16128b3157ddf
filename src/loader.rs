//! Load coordinator.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use dashmap::DashMap;
use nll_cache::{
    DirectoryResources, ExtractionCache, LibraryKey, ResourceProvider, ScratchDirs, ScratchRegistry,
    TeardownGuard,
};
use nll_platform::{
    host_arch_name, host_os_name, resolve_platform, AbiProbe, PlatformKey, ReadelfProbe,
};
use tracing::{debug, info, warn};

use crate::config::{
    ConfigOrigin, ConfigSource, LayeredConfig, LoaderConfig, TomlConfig, CONFIG_FILE_ENV,
};
use crate::dynload::{DynamicLoader, SystemLoader};
use crate::error::{LoaderError, LoaderResult};
use crate::namespace::validate_namespace;
use crate::overrides::{CustomResourceOverride, OverrideOutcome};

/// Loads bundled native libraries into the running process.
///
/// One loader owns the platform key, the extraction cache and the record of
/// loaded libraries. `load_library` and `extract_library` share a single
/// lock, so concurrent callers never extract or load the same library twice.
pub struct NativeLibraryLoader {
    lock: Mutex<()>,
    platform: OnceLock<PlatformKey>,
    os_name: String,
    arch_name: String,
    probe: Box<dyn AbiProbe>,
    config: Box<dyn ConfigSource>,
    cache: ExtractionCache,
    dynamic_loader: Box<dyn DynamicLoader>,
    loaded: DashMap<LibraryKey, PathBuf>,
}

impl NativeLibraryLoader {
    /// Start configuring a loader.
    ///
    /// The loader never deletes what it extracts on its own: hold
    /// [`teardown_guard`](Self::teardown_guard) for as long as the libraries
    /// are in use, or the files stay in the scratch root after exit.
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    /// Loader configured from the process environment.
    ///
    /// If `NATIVE_LIBRARY_LOADER_CONFIG` names a TOML file, its values sit
    /// below the environment. As with [`builder`](Self::builder), extracted
    /// files outlive the process unless a [`teardown_guard`](Self::teardown_guard)
    /// is held.
    pub fn from_env() -> LoaderResult<Self> {
        let mut config = LayeredConfig::from_env();
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
            let file = TomlConfig::load(Path::new(&path))?;
            config = config.with_layer(ConfigOrigin::File, file);
        }
        Ok(Self::builder().config(config).build())
    }

    /// Load `library` from `namespace` into the process.
    ///
    /// The first call for a library resolves its file, from the custom
    /// override directory when one holds it and otherwise by extracting the
    /// bundled copy. Later calls reuse that file. Returns the loaded path.
    pub fn load_library(&self, namespace: &str, library: &str) -> LoaderResult<PathBuf> {
        validate_namespace(namespace)?;
        let key = LibraryKey::new(namespace, library);

        let _guard = self.lock();
        info!(library = %key, "loading native library");

        let path = match self.loaded.get(&key).map(|path| path.clone()) {
            Some(path) => path,
            None => self.resolve_library(&key)?,
        };
        debug!(library = %key, path = %path.display(), "native library path");

        self.dynamic_loader
            .load(&path)
            .map_err(|source| LoaderError::LibraryLoadFailed {
                library: key.library.clone(),
                path: path.clone(),
                source,
            })?;
        self.loaded.insert(key.clone(), path.clone());

        info!(library = %key, "native library loaded");
        Ok(path)
    }

    /// Extract `library` from `namespace` without loading it.
    ///
    /// Dependencies of a library can be extracted this way so they sit next
    /// to it in the namespace's scratch directory before it is loaded.
    pub fn extract_library(&self, namespace: &str, library: &str) -> LoaderResult<PathBuf> {
        validate_namespace(namespace)?;
        let key = LibraryKey::new(namespace, library);

        let _guard = self.lock();
        let platform = self.resolved_platform()?;
        Ok(self.cache.extract(&key, platform)?)
    }

    /// The platform libraries are resolved for. Resolved on first use.
    pub fn platform(&self) -> LoaderResult<PlatformKey> {
        let _guard = self.lock();
        self.resolved_platform().cloned()
    }

    /// Path a library was loaded from, if it was.
    pub fn loaded_path(&self, namespace: &str, library: &str) -> Option<PathBuf> {
        self.loaded
            .get(&LibraryKey::new(namespace, library))
            .map(|path| path.clone())
    }

    /// Scratch directory of `namespace`, if one was created.
    pub fn scratch_dir(&self, namespace: &str) -> Option<PathBuf> {
        self.cache.scratch().get(namespace)
    }

    /// Root under which namespace scratch directories are created.
    pub fn scratch_root(&self) -> &Path {
        self.cache.scratch().root()
    }

    /// Registry of the scratch directories this loader created.
    pub fn scratch_registry(&self) -> Arc<ScratchRegistry> {
        self.cache.scratch().registry()
    }

    /// Guard that removes this loader's scratch directories when dropped.
    ///
    /// Without one, extracted libraries are left in the scratch root.
    pub fn teardown_guard(&self) -> TeardownGuard {
        TeardownGuard::new(self.scratch_registry())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Callers hold the coordinator lock, so the probe runs at most once.
    fn resolved_platform(&self) -> LoaderResult<&PlatformKey> {
        if let Some(platform) = self.platform.get() {
            return Ok(platform);
        }
        let platform = resolve_platform(&self.os_name, &self.arch_name, self.probe.as_ref())?;
        Ok(self.platform.get_or_init(|| platform))
    }

    fn resolve_library(&self, key: &LibraryKey) -> LoaderResult<PathBuf> {
        let platform = self.resolved_platform()?;

        match CustomResourceOverride::new(self.config.as_ref()).resolve(
            &key.namespace,
            &key.library,
            platform,
        ) {
            OverrideOutcome::Found(path) => {
                info!(library = %key, path = %path.display(), "using custom resource");
                return Ok(path);
            }
            OverrideOutcome::Missing(path) => {
                warn!(
                    library = %key,
                    path = %path.display(),
                    "custom resource not found, falling back to bundled library"
                );
            }
            OverrideOutcome::NotConfigured => {}
        }

        Ok(self.cache.extract(key, platform)?)
    }
}

impl fmt::Debug for NativeLibraryLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibraryLoader")
            .field("platform", &self.platform.get())
            .field("os_name", &self.os_name)
            .field("arch_name", &self.arch_name)
            .field("cache", &self.cache)
            .field("loaded", &self.loaded.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`NativeLibraryLoader`].
///
/// Defaults: bundled resources next to the executable, process environment
/// for configuration, the system dynamic loader, `readelf` for the ARM ABI
/// and the host's OS and architecture names.
#[derive(Default)]
pub struct LoaderBuilder {
    settings: LoaderConfig,
    resources: Option<Arc<dyn ResourceProvider>>,
    config: Option<Box<dyn ConfigSource>>,
    dynamic_loader: Option<Box<dyn DynamicLoader>>,
    probe: Option<Box<dyn AbiProbe>>,
    platform: Option<PlatformKey>,
    registry: Option<Arc<ScratchRegistry>>,
}

impl LoaderBuilder {
    /// Replace all builder-level settings at once.
    pub fn settings(mut self, settings: LoaderConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Root for scratch directories (`<temp>/native_library_loader` by default).
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.settings.scratch_root = root.into();
        self
    }

    /// Candidate scratch indices tried per namespace (20 by default).
    pub fn max_scratch_attempts(mut self, attempts: usize) -> Self {
        self.settings.max_scratch_attempts = attempts;
        self
    }

    /// Raw OS name to resolve, e.g. `"Linux"` or `"Windows 10"`.
    pub fn os_name(mut self, name: impl Into<String>) -> Self {
        self.settings.os_name = Some(name.into());
        self
    }

    /// Raw architecture name to resolve, e.g. `"amd64"` or `"armv7l"`.
    pub fn arch_name(mut self, name: impl Into<String>) -> Self {
        self.settings.arch_name = Some(name.into());
        self
    }

    /// Skip resolution and use `platform` as is.
    pub fn platform(mut self, platform: PlatformKey) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Bundle the libraries are extracted from.
    pub fn resources(mut self, resources: impl ResourceProvider + 'static) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    /// Source of operator settings such as custom resource directories.
    pub fn config(mut self, config: impl ConfigSource + 'static) -> Self {
        self.config = Some(Box::new(config));
        self
    }

    /// Primitive that maps resolved files into the process.
    pub fn dynamic_loader(mut self, loader: impl DynamicLoader + 'static) -> Self {
        self.dynamic_loader = Some(Box::new(loader));
        self
    }

    /// ARM float-ABI check used when the architecture is an ARM variant.
    pub fn abi_probe(mut self, probe: impl AbiProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Record scratch directories in a registry shared with other loaders.
    pub fn registry(mut self, registry: Arc<ScratchRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Assemble the loader. Nothing touches the filesystem until first use.
    pub fn build(self) -> NativeLibraryLoader {
        let LoaderConfig {
            scratch_root,
            max_scratch_attempts,
            os_name,
            arch_name,
        } = self.settings;

        let mut scratch = ScratchDirs::new(scratch_root).with_max_attempts(max_scratch_attempts);
        if let Some(registry) = self.registry {
            scratch = scratch.with_registry(registry);
        }
        let resources = self.resources.unwrap_or_else(default_resources);

        let platform = OnceLock::new();
        if let Some(preset) = self.platform {
            let _ = platform.set(preset);
        }

        NativeLibraryLoader {
            lock: Mutex::new(()),
            platform,
            os_name: os_name.unwrap_or_else(|| host_os_name().to_string()),
            arch_name: arch_name.unwrap_or_else(|| host_arch_name().to_string()),
            probe: self.probe.unwrap_or_else(|| Box::new(ReadelfProbe::new())),
            config: self.config.unwrap_or_else(|| Box::new(LayeredConfig::from_env())),
            cache: ExtractionCache::new(scratch, resources),
            dynamic_loader: self.dynamic_loader.unwrap_or_else(|| Box::new(SystemLoader::new())),
            loaded: DashMap::new(),
        }
    }
}

/// Resource tree in the executable's directory.
fn default_resources() -> Arc<dyn ResourceProvider> {
    let root = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    Arc::new(DirectoryResources::new(root))
}
