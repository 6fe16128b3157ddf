//! Platform resolution for native-library-loader
//!
//! Maps raw operating-system and CPU-architecture strings to a canonical
//! [`PlatformKey`] and composes the lookup path of a bundled native library:
//!
//! ```text
//! /native/<namespace-as-path>/<os>/<arch>/<library>.<ext>
//! ```
//!
//! Nothing in this crate touches the filesystem except [`ReadelfProbe`],
//! which inspects the running executable to tell ARM hard-float from
//! soft-float.

mod arch;
mod error;
mod host;
mod key;
mod os;
mod resource_path;

pub use arch::{
    resolve_architecture, AbiProbe, ReadelfProbe, ARCH_ARMEL, ARCH_ARMHF, HARD_FLOAT_TAG,
};
pub use error::{PlatformError, PlatformResult};
pub use host::{host_arch_name, host_os_name};
pub use key::{resolve_platform, PlatformKey};
pub use os::{resolve_os, OsFamily};
pub use resource_path::{
    build_resource_path, library_file_name, namespace_segments, platform_relative_path,
    RESOURCE_ROOT,
};
