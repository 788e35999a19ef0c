//! Content-type classification for media assets.
//!
//! Lookup is by file extension, case-insensitive. Anything unrecognized is served as
//! `application/octet-stream`.

use std::path::Path;

/// Fallback MIME type for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extensions picked up by a directory scan. Subtitles are classified but not scanned.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "mov", "avi", "mkv", "m3u8", "ts", "flv", "wmv",
];

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("ts", "video/mp2t"),
    ("flv", "video/x-flv"),
    ("wmv", "video/x-ms-wmv"),
    ("vtt", "text/vtt"),
    ("srt", "application/x-subrip"),
];

fn extension_of(file_name: impl AsRef<Path>) -> Option<String> {
    file_name
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Map a file name (or path) to its MIME type.
pub fn content_type_for(file_name: impl AsRef<Path>) -> &'static str {
    let Some(ext) = extension_of(file_name) else {
        return DEFAULT_CONTENT_TYPE;
    };

    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Whether a directory scan should pick up this file.
pub fn is_supported_video(file_name: impl AsRef<Path>) -> bool {
    extension_of(file_name)
        .map(|ext| SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
