//! Identity of a bundled library.

use std::fmt;

/// Identity of a bundled library: caller namespace plus library name.
///
/// Equality is exact and case-sensitive on both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryKey {
    pub namespace: String,
    pub library: String,
}

impl LibraryKey {
    /// Key for `library` in `namespace`, both taken verbatim.
    pub fn new(namespace: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            library: library.into(),
        }
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.library)
    }
}
