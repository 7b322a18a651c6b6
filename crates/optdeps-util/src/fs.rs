//! Filesystem reads used by resolution and loading.

use std::fs;
use std::io;
use std::path::Path;

/// Read module source. Invalid UTF-8 becomes U+FFFD rather than an error,
/// since loaders only inspect and forward the text.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_source(path: &Path) -> io::Result<String> {
    fs::read(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a `package.json`; a zero-byte file reads as `{}`.
///
/// An interrupted install can leave a zero-byte manifest behind. Whitespace
/// is returned as-is and fails to parse like any other invalid manifest.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_manifest_text(path: &Path) -> io::Result<String> {
    let text = read_source(path)?;
    Ok(if text.is_empty() {
        "{}".to_string()
    } else {
        text
    })
}

/// Whether `path` exists. Dangling symlinks and permission errors count as absent.
#[must_use]
pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_source_replaces_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.js");
        fs::write(&path, b"exports.a = '\xff';").unwrap();

        let source = read_source(&path).unwrap();
        assert!(source.starts_with("exports.a"));
        assert!(source.contains('\u{FFFD}'));
    }

    #[test]
    fn test_zero_byte_manifest_is_empty_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "").unwrap();
        assert_eq!(read_manifest_text(&path).unwrap(), "{}");

        fs::write(&path, "   \n").unwrap();
        assert_eq!(read_manifest_text(&path).unwrap(), "   \n");

        fs::write(&path, r#"{"main": "index.js"}"#).unwrap();
        assert_eq!(read_manifest_text(&path).unwrap(), r#"{"main": "index.js"}"#);
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(read_manifest_text(&dir.path().join("package.json")).is_err());
    }

    #[test]
    fn test_exists() {
        let dir = tempdir().unwrap();
        assert!(exists(dir.path()));
        assert!(!exists(&dir.path().join("node_modules")));
    }
}
