//! Staging test data files in temporary directories.
//!
//! Rasters and regions are read from directories of JSON files in tests,
//! laid out the same way as blob storage.

use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Writes `value` as JSON to `dir/relative`, creating parent directories.
///
/// Returns the full path written.
pub fn write_json(dir: &Path, relative: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create test data directory");
    }
    let json = serde_json::to_string_pretty(value).expect("Failed to serialize test JSON");
    std::fs::write(&path, json).expect("Failed to write test JSON");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_creates_parents() {
        let dir = temp_test_dir();
        let path = write_json(dir.path(), "a/b/c.json", &serde_json::json!({"x": 1}));
        assert!(path.exists());
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back["x"], 1);
    }
}
