//! Bundled resource layout.
//!
//! Layout: `/native/<namespace-as-path>/<os>/<arch>/<library>.<ext>`
//!
//! The result is a lookup key into the bundle, not a filesystem path.

use crate::key::PlatformKey;

/// First path segment of every bundled native library.
pub const RESOURCE_ROOT: &str = "native";

/// Non-empty segments of a dotted namespace (`com.acme.codec` → `com`, `acme`, `codec`).
pub fn namespace_segments(namespace: &str) -> impl Iterator<Item = &str> {
    namespace.split('.').filter(|segment| !segment.is_empty())
}

/// File name of a library on the given platform (`fastz.so`).
pub fn library_file_name(library: &str, platform: &PlatformKey) -> String {
    format!("{}.{}", library, platform.library_extension())
}

/// Platform-dependent tail of the layout: `<os>/<arch>/<library>.<ext>`.
pub fn platform_relative_path(library: &str, platform: &PlatformKey) -> String {
    format!(
        "{}/{}/{}",
        platform.os.dir_name(),
        platform.arch,
        library_file_name(library, platform)
    )
}

/// Full lookup path of a library inside the bundle.
pub fn build_resource_path(namespace: &str, library: &str, platform: &PlatformKey) -> String {
    let mut path = format!("/{RESOURCE_ROOT}");
    for segment in namespace_segments(namespace) {
        path.push('/');
        path.push_str(segment);
    }
    path.push('/');
    path.push_str(&platform_relative_path(library, platform));
    path
}
