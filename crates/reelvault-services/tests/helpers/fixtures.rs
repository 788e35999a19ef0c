//! On-disk media trees for batch tests.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Files written by [`create_media_tree`]: relative path and contents.
pub const MEDIA_TREE: &[(&str, &[u8])] = &[
    ("intro.mp4", b"intro-video-bytes"),
    ("hls/index.m3u8", b"#EXTM3U\n#EXT-X-VERSION:3\n"),
    ("hls/720p/seg0.ts", b"transport-stream-segment"),
];

/// A source tree with three uploadable files and two that are ignored.
pub fn create_media_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (relative, contents) in MEDIA_TREE {
        write_file(dir.path(), relative, contents);
    }
    write_file(dir.path(), "notes.txt", b"not media");
    write_file(dir.path(), "hls/subs.vtt", b"WEBVTT");
    dir
}

/// A flat tree of `count` small `.mp4` files.
pub fn create_flat_tree(count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for i in 0..count {
        write_file(dir.path(), &format!("clip{}.mp4", i), format!("clip {}", i).as_bytes());
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
