//! Recursive discovery of uploadable media files.
//!
//! The scan is lazy: directories are read one at a time as the iterator is pulled. Order
//! follows the filesystem's directory order and is not guaranteed. Calling [`scan`] again
//! starts a fresh traversal.

use reelvault_core::{is_supported_video, LocalAsset};
use std::fs;
use std::path::{Path, PathBuf};

/// Lazily walks `root`, yielding every file with a supported video extension.
pub fn scan(root: &Path) -> AssetScanner {
    AssetScanner {
        pending: vec![root.to_path_buf()],
        current: None,
    }
}

/// Iterator returned by [`scan`].
///
/// Unreadable directories and entries are logged and skipped. Symlinked files are
/// followed, symlinked directories are not.
pub struct AssetScanner {
    pending: Vec<PathBuf>,
    current: Option<fs::ReadDir>,
}

impl Iterator for AssetScanner {
    type Item = LocalAsset;

    fn next(&mut self) -> Option<LocalAsset> {
        loop {
            if let Some(entries) = self.current.as_mut() {
                match entries.next() {
                    Some(Ok(entry)) => {
                        let path = entry.path();
                        match entry.file_type() {
                            Ok(file_type) if file_type.is_dir() => {
                                self.pending.push(path);
                                continue;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                                continue;
                            }
                        }

                        if !is_supported_video(&path) {
                            continue;
                        }

                        match fs::metadata(&path) {
                            Ok(meta) if meta.is_file() => {
                                return Some(LocalAsset::new(path, meta.len()));
                            }
                            Ok(_) => continue,
                            Err(e) => {
                                tracing::warn!(path = %path.display(), error = %e, "Skipping file that cannot be stat'ed");
                                continue;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Skipping unreadable directory entry");
                        continue;
                    }
                    None => self.current = None,
                }
            }

            let dir = self.pending.pop()?;
            match fs::read_dir(&dir) {
                Ok(entries) => self.current = Some(entries),
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                }
            }
        }
    }
}
