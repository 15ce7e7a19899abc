//! CORS middleware
//!
//! Adds the permissive cross-origin headers to every response and answers
//! preflight (`OPTIONS`) requests with an empty 200.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, InvalidHeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};

use super::middleware::Middleware;
use super::response::build_empty_response;
use crate::config::CorsConfig;

#[derive(Debug, Clone)]
pub struct Cors {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl Cors {
    pub fn from_config(cfg: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(&cfg.allow_origin)?,
            allow_methods: HeaderValue::from_str(&cfg.allow_methods)?,
            allow_headers: HeaderValue::from_str(&cfg.allow_headers)?,
        })
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("GET, POST, OPTIONS"),
            allow_headers: HeaderValue::from_static("Content-Type, Authorization"),
        }
    }
}

impl Middleware for Cors {
    fn intercept(&self, req: &Parts) -> Option<Response<Full<Bytes>>> {
        (req.method == Method::OPTIONS).then(|| build_empty_response(StatusCode::OK))
    }

    fn decorate(&self, resp: &mut Response<Full<Bytes>>) {
        let headers = resp.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }
}
