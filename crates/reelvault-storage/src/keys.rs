//! Object key construction shared by every backend and the ingestion engine.
//!
//! Key format: `prefix + relative_path`, `/` as the only separator.

use std::path::Path;

/// Normalize a user-supplied prefix: empty stays empty, anything else ends with exactly one `/`.
/// Backslashes become `/` and leading separators are dropped.
pub fn normalize_prefix(prefix: &str) -> String {
    let unified = prefix.replace('\\', "/");
    let trimmed = unified.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Map a file found under `root` to its object key.
///
/// `prefix` is expected to be normalized (see [`normalize_prefix`]). A path that is not
/// under `root` is keyed by the path itself.
pub fn object_key(root: &Path, file: &Path, prefix: &str) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let relative = relative.to_string_lossy().replace('\\', "/");
    let relative = relative.trim_start_matches('/');

    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{}{}", prefix, relative)
    } else {
        format!("{}/{}", prefix, relative)
    }
}
