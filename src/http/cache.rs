//! Conditional GET support for static files
//!
//! `Last-Modified` / `If-Modified-Since` handling at one-second resolution.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a modification time as an HTTP date
pub fn http_date(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified).format(HTTP_DATE).to_string()
}

/// True when the client's copy is at least as new as `modified`
///
/// Unparseable or absent headers never match.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    else {
        return false;
    };

    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
