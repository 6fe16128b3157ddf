//! Post-order recursive directory removal.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

/// Delete `path` and everything beneath it, children before parents.
///
/// Symbolic links are removed, never followed, including a link at `path`
/// itself. The first error aborts the walk; whatever was deleted up to that
/// point stays deleted.
pub fn remove_dir_tree(path: &Path) -> io::Result<()> {
    debug!(path = %path.display(), "deleting directory tree");

    let walker = WalkDir::new(path)
        .follow_links(false)
        .follow_root_links(false)
        .contents_first(true);

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }

    debug!(path = %path.display(), "deleted directory tree");
    Ok(())
}
