//! Generic upstream forwarding primitive
//!
//! Builds one outbound request, sends it once and hands back the upstream
//! status and raw body. No retries and no payload inspection.

use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::http::response::JSON_CONTENT_TYPE;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The upstream answered but its body could not be read
    #[error("reading upstream body failed (status {status}): {source}")]
    Body {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },
}

/// Outbound request to an upstream
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ForwardRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// POST with an already serialized JSON body
    pub fn post_json(url: Url, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Self {
            method: Method::POST,
            url,
            headers,
            body: Some(body.into()),
        }
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// What the upstream answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Join `base` and `path`, then append `query` pairs (form-encoded)
pub fn upstream_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, ForwardError> {
    let raw = format!("{}{path}", base.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|source| ForwardError::InvalidUrl {
        url: raw.clone(),
        source,
    })?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Send `req` once and relay what came back
pub async fn forward(
    client: &reqwest::Client,
    req: ForwardRequest,
) -> Result<UpstreamResponse, ForwardError> {
    let mut outbound = client
        .request(req.method, req.url)
        .headers(req.headers);
    if let Some(body) = req.body {
        outbound = outbound.body(body);
    }

    let resp = outbound.send().await.map_err(ForwardError::Transport)?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|source| ForwardError::Body { status, source })?;

    Ok(UpstreamResponse { status, body })
}
