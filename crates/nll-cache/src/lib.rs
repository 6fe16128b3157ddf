//! Extraction cache for bundled native libraries
//!
//! Materializes bundled library bytes into a per-namespace scratch directory
//! and remembers the resulting path for the lifetime of the cache:
//! - Directory layout: `<root>/<namespace-as-path>/<n>/<library>.<ext>`
//! - `<n>` starts at 0; a leftover directory is deleted and reused, and an
//!   undeletable one (held by another live process) is skipped in favour of
//!   the next index, up to [`MAX_SCRATCH_ATTEMPTS`]
//! - Writes go to a temp file and are renamed into place
//!
//! ## Resources
//!
//! Bundled bytes come from a [`ResourceProvider`] keyed by the lookup path
//! built in `nll-platform`. A directory tree, an in-memory table and a tar
//! archive are provided.
//!
//! ## Teardown
//!
//! Scratch directories are recorded in a [`ScratchRegistry`]; a
//! [`TeardownGuard`] or the opt-in signal hook removes them best-effort.

mod error;
mod extract;
mod key;
mod remove;
mod resources;
mod scratch;
mod teardown;

pub use error::{CacheError, CacheResult};
pub use extract::ExtractionCache;
pub use key::LibraryKey;
pub use remove::remove_dir_tree;
pub use resources::{
    DirectoryResources, EmbeddedResources, ResourceProvider, ResourceReader, TarResources,
};
pub use scratch::{
    default_scratch_root, RemoveFn, ScratchDirs, ScratchRegistry, MAX_SCRATCH_ATTEMPTS,
    SCRATCH_DIR_NAME,
};
pub use teardown::{install_signal_teardown, TeardownGuard, EXIT_CODE_INTERRUPTED};
