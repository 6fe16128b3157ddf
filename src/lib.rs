//! Native library loader
//!
//! Loads platform-specific native libraries shipped inside an application's
//! resource bundle. Bundled libraries live at
//! `/native/<namespace-as-path>/<os>/<arch>/<library>.<ext>`; on first use a
//! library is extracted into a per-namespace scratch directory and handed to
//! the platform's dynamic loader.
//!
//! ```no_run
//! use native_library_loader::{DirectoryResources, NativeLibraryLoader};
//!
//! # fn main() -> Result<(), native_library_loader::LoaderError> {
//! let loader = NativeLibraryLoader::builder()
//!     .resources(DirectoryResources::new("/usr/share/acme"))
//!     .build();
//! let _teardown = loader.teardown_guard();
//!
//! loader.extract_library("com.acme.codec", "zdeps")?;
//! loader.load_library("com.acme.codec", "fastz")?;
//! # Ok(())
//! # }
//! ```
//!
//! An operator can point a namespace at pre-installed libraries with the
//! `native_library_loader_<namespace>_path` setting; see [`config`].

pub mod config;
pub mod dynload;
pub mod error;
pub mod loader;
pub mod namespace;
pub mod overrides;

pub use config::{ConfigSource, EnvConfig, LayeredConfig, LoaderConfig, MapConfig, TomlConfig};
pub use dynload::{DynamicLoader, LoadFailure, SystemLoader};
pub use error::{LoaderError, LoaderResult};
pub use loader::{LoaderBuilder, NativeLibraryLoader};
pub use namespace::validate_namespace;
pub use overrides::{CustomResourceOverride, OverrideOutcome};

pub use nll_cache::{
    install_signal_teardown, DirectoryResources, EmbeddedResources, ResourceProvider,
    ResourceReader, ScratchRegistry, TarResources, TeardownGuard,
};
pub use nll_platform::{AbiProbe, OsFamily, PlatformKey, ReadelfProbe};
