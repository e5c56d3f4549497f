//! MIME type from file extension.

use std::path::Path;

const FALLBACK: &str = "application/octet-stream";

pub fn guess(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);

  match ext.as_deref() {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("svg") => "image/svg+xml",
    Some("bmp") => "image/bmp",
    Some("avif") => "image/avif",
    _ => FALLBACK,
  }
}
