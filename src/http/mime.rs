//! MIME type detection module
//!
//! Returns the Content-Type for a static file based on its extension.

use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// Stylesheets and scripts always get `text/css` and
/// `application/javascript`; the browser front-end relies on both.
///
/// # Examples
/// ```
/// use fitness_proxy::http::mime::content_type_for;
/// assert_eq!(content_type_for("style.css".as_ref()), "text/css");
/// assert_eq!(content_type_for("script.js".as_ref()), "application/javascript");
/// assert_eq!(content_type_for("blob".as_ref()), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("css") => "text/css",
        Some("js" | "mjs") => "application/javascript",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "text/xml; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
