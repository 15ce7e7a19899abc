//! Static file serving module
//!
//! Maps request paths onto files under the configured root, `/` being the
//! index document.

use crate::config::StaticFilesConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve the file behind `ctx.path`
///
/// Every method is served like GET; HEAD keeps the headers and drops the body.
pub async fn serve(ctx: &RequestContext<'_>, cfg: &StaticFilesConfig) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve(&cfg.root, &cfg.index_file, ctx.path) else {
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&file_path).await {
        Ok(m) if m.is_file() => m,
        // Missing files and directories are both plain misses
        _ => return http::build_404_response(),
    };

    let last_modified = metadata.modified().ok().map(cache::http_date);
    if let (Some(lm), Ok(modified)) = (last_modified.as_deref(), metadata.modified()) {
        if cache::not_modified_since(ctx.if_modified_since.as_deref(), modified) {
            return http::build_304_response(lm);
        }
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response();
        }
    };

    http::build_file_response(
        Bytes::from(content),
        mime::content_type_for(&file_path),
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Resolve a request path to a file inside `root`
///
/// Returns `None` when the root is unusable, the target does not exist, or
/// the target escapes the root once symlinks and `..` are resolved.
pub fn resolve(root: &str, index_file: &str, path: &str) -> Option<PathBuf> {
    let relative = match path.trim_start_matches('/') {
        "" => index_file,
        rel => rel,
    };

    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    // Not found is the common case, no need to log it
    let candidate = root_canonical.join(relative).canonicalize().ok()?;
    if !candidate.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            candidate.display()
        ));
        return None;
    }

    Some(candidate)
}
