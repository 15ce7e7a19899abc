//! HTTP response building module
//!
//! Builders for the status codes the proxy produces itself. Relayed upstream
//! responses are built by the forwarders.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED,
    X_CONTENT_TYPE_OPTIONS,
};
use hyper::{Response, StatusCode};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Plain-text error response, body is the message plus a newline
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Full::new(Bytes::from(format!("{message}\n"))))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Error response for a JSON endpoint: keeps the permissive origin header
pub fn build_api_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut resp = build_error_response(status, message);
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

/// JSON response carrying `body` untouched
pub fn build_json_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            fallback(StatusCode::NOT_MODIFIED)
        })
}

/// Response with a status and no body (preflight answers)
pub fn build_empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

/// Build 200 response for a static file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length);
    if let Some(lm) = last_modified {
        builder = builder.header(LAST_MODIFIED, lm);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn fallback(status: StatusCode) -> Response<Full<Bytes>> {
    build_empty_response(status)
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
