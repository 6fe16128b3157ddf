//! Namespace validation.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{LoaderError, LoaderResult};

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.]+$").expect("namespace pattern compiles"))
}

/// Check that `namespace` is a dotted identifier such as `com.acme.codec`.
///
/// Word characters and dots only, with at least one word character, so the
/// namespace always maps to a non-empty relative path.
pub fn validate_namespace(namespace: &str) -> LoaderResult<()> {
    if namespace_pattern().is_match(namespace) && namespace.chars().any(|c| c != '.') {
        Ok(())
    } else {
        Err(LoaderError::InvalidNamespace(namespace.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_namespaces() {
        for ns in ["com.acme.codec", "serial", "de.sitec_systems.io", "a1.b2", "_"] {
            assert!(validate_namespace(ns).is_ok(), "{ns} should be valid");
        }
    }

    #[test]
    fn test_invalid_namespaces() {
        let invalid = [
            "",
            "com/acme",
            "com acme",
            "com.acme-codec",
            "../etc",
            "...",
            "com.acme\n",
            "ü.x",
        ];
        for ns in invalid {
            match validate_namespace(ns) {
                Err(LoaderError::InvalidNamespace(got)) => assert_eq!(got, ns),
                other => panic!("{ns:?} should be invalid, got {other:?}"),
            }
        }
    }
}
