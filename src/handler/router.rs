//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS wrapping, dispatch by path
//! and body size limits for the routes that read a body.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, middleware, Middleware};
use crate::logger;
use crate::proxy::{auth, exercises};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, IF_MODIFIED_SINCE, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed by the handlers
pub struct RequestContext<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_modified_since: parts
                .headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        }
    }
}

/// Routes the proxy answers itself; everything else is a static path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Muscles,
    Exercises,
    Signup,
    Login,
    Logout,
    Static,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/api/muscles" => Self::Muscles,
            "/api/exercises" => Self::Exercises,
            "/api/auth/signup" => Self::Signup,
            "/api/auth/login" => Self::Login,
            "/api/auth/logout" => Self::Logout,
            _ => Self::Static,
        }
    }

    const fn reads_body(self) -> bool {
        matches!(self, Self::Signup | Self::Login)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let layers: [&dyn Middleware; 1] = [&state.cors];

    let mut resp =
        middleware::run(&layers, &parts, || async { dispatch(&parts, body, &state).await }).await;

    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        resp.headers_mut().insert(SERVER, name);
    }
    Ok(resp)
}

async fn dispatch<B>(parts: &Parts, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let ctx = RequestContext::from_parts(parts);
    let route = Route::from_path(ctx.path);

    // Only signup and login consume a body; other routes ignore its size
    let payload = if route.reads_body() {
        let max_body_size = state.config.http.max_body_size;
        if let Some(resp) = check_body_size(parts, max_body_size) {
            return resp;
        }
        match read_body(body, max_body_size).await {
            Ok(bytes) => bytes,
            Err(resp) => return resp,
        }
    } else {
        Bytes::new()
    };

    match route {
        Route::Muscles => exercises::list_muscles(state).await,
        Route::Exercises => exercises::list_exercises(state, ctx.query).await,
        Route::Signup => auth::signup(state, &payload).await,
        Route::Login => auth::login(state, &payload).await,
        Route::Logout => auth::logout(),
        Route::Static => static_files::serve(&ctx, &state.config.static_files).await,
    }
}

/// Collect the request body, refusing it once it grows past `max_body_size`
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!(
                "Request body too large (max: {max_body_size} bytes)"
            ));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            // An empty payload fails to decode, which answers 400
            Ok(Bytes::new())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = parts.headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::proxy::auth::LOGOUT_BODY;
    use crate::proxy::test_support::dead_base;
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
    use hyper::StatusCode;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATHS: [&str; 7] = [
        "/api/muscles",
        "/api/exercises",
        "/api/auth/signup",
        "/api/auth/login",
        "/api/auth/logout",
        "/",
        "/style.css",
    ];

    fn state(exercise_base: &str, auth_base: &str, root: &str) -> Arc<AppState> {
        Arc::new(AppState::new(&test_config(exercise_base, auth_base, root)).unwrap())
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, Response<Full<Bytes>>, Bytes) {
        let resp = handle_request(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (status, Response::from_parts(parts, Full::new(Bytes::new())), bytes)
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/api/muscles"), Route::Muscles);
        assert_eq!(Route::from_path("/api/auth/logout"), Route::Logout);
        assert_eq!(Route::from_path("/api/muscles/"), Route::Static);
        assert_eq!(Route::from_path("/index.html"), Route::Static);
    }

    #[tokio::test]
    async fn test_preflight_everywhere_without_upstream_calls() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;
        let state = state(&upstream.uri(), &upstream.uri(), "/definitely/missing");

        for path in PATHS {
            let (status, resp, body) = send(&state, request(Method::OPTIONS, path, "")).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert!(body.is_empty(), "{path}");
        }
    }

    #[tokio::test]
    async fn test_every_response_has_origin_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "h1{}").unwrap();
        let dead = dead_base();
        let state = state(&dead, &dead, dir.path().to_str().unwrap());

        let cases = [
            request(Method::GET, "/style.css", ""),
            request(Method::GET, "/missing.js", ""),
            request(Method::GET, "/api/exercises", ""),
            request(Method::POST, "/api/auth/signup", "{"),
            request(Method::POST, "/api/auth/logout", ""),
        ];
        for req in cases {
            let uri = req.uri().clone();
            let (_, resp, _) = send(&state, req).await;
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_static_and_api_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "h1{}").unwrap();
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .expect(1)
            .mount(&upstream)
            .await;
        let state = state(&upstream.uri(), &dead_base(), dir.path().to_str().unwrap());

        let (status, resp, body) = send(&state, request(Method::GET, "/style.css", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/css");
        assert_eq!(body, "h1{}");

        let (status, _, _) = send(&state, request(Method::GET, "/nothing-here", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&state, request(Method::GET, "/api/muscles", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_logout_ignores_body_and_headers() {
        let state = state(&dead_base(), &dead_base(), ".");
        let mut req = request(Method::POST, "/api/auth/logout", "garbage");
        req.headers_mut()
            .insert("authorization", HeaderValue::from_static("Bearer abc"));

        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, LOGOUT_BODY);
    }

    #[tokio::test]
    async fn test_oversized_bodies_rejected() {
        let mut cfg = test_config(&dead_base(), &dead_base(), ".");
        cfg.http.max_body_size = 8;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        // Declared length over the limit
        let mut req = request(Method::POST, "/api/auth/login", "");
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("1000"));
        let (status, resp, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        // Actual body over the limit
        let req = request(
            Method::POST,
            "/api/auth/login",
            r#"{"email":"a@b.fr","password":"long enough"}"#,
        );
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_declared_length_ignored_where_no_body_is_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "h1{}").unwrap();
        let mut cfg = test_config(&dead_base(), &dead_base(), dir.path().to_str().unwrap());
        cfg.http.max_body_size = 8;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let mut req = request(Method::POST, "/api/auth/logout", "");
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("2000000"));
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, LOGOUT_BODY);

        let mut req = request(Method::GET, "/style.css", "");
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("2000000"));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);

        // No muscle given: answered before any upstream call
        let mut req = request(Method::GET, "/api/exercises", "");
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("2000000"));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
