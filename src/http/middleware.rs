//! Middleware chain
//!
//! A middleware may answer a request on its own (`intercept`) and may adjust
//! every outgoing response (`decorate`). Layers run in order: the first layer
//! that intercepts wins, then all layers decorate the response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::Response;
use std::future::Future;

pub trait Middleware: Send + Sync {
    /// Answer the request directly, skipping the inner handler
    fn intercept(&self, _req: &Parts) -> Option<Response<Full<Bytes>>> {
        None
    }

    /// Adjust the response produced by the handler or by an interception
    fn decorate(&self, _resp: &mut Response<Full<Bytes>>) {}
}

/// Run `handler` behind `layers`
pub async fn run<F, Fut>(
    layers: &[&dyn Middleware],
    req: &Parts,
    handler: F,
) -> Response<Full<Bytes>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Response<Full<Bytes>>>,
{
    let intercepted = layers.iter().find_map(|layer| layer.intercept(req));
    let mut resp = match intercepted {
        Some(resp) => resp,
        None => handler().await,
    };

    for layer in layers {
        layer.decorate(&mut resp);
    }
    resp
}
