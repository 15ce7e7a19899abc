//! Exercise-data forwarder
//!
//! `GET /api/muscles` and `GET /api/exercises?muscle=<id>` relayed to the
//! public exercise API.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::forwarder::{forward, upstream_url, ForwardError, ForwardRequest};
use crate::config::AppState;
use crate::http::{build_api_error_response, build_json_response};
use crate::logger;

pub const MSG_UPSTREAM_CALL_FAILED: &str = "Erreur lors de l'appel à l'API";
pub const MSG_UPSTREAM_READ_FAILED: &str = "Erreur de lecture";
pub const MSG_MUSCLE_REQUIRED: &str = "Paramètre 'muscle' requis";

/// List muscle groups
pub async fn list_muscles(state: &AppState) -> Response<Full<Bytes>> {
    let base = &state.config.upstream.exercise.base_url;
    relay(state, upstream_url(base, "/muscle/", &[])).await
}

/// List exercises working the muscle named by the `muscle` query parameter
///
/// An absent or empty `muscle` is rejected before any upstream call.
pub async fn list_exercises(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let Some(muscle_id) = query_value(query, "muscle") else {
        logger::log_warning("exercises requested without 'muscle' parameter");
        return build_api_error_response(StatusCode::BAD_REQUEST, MSG_MUSCLE_REQUIRED);
    };

    let exercise = &state.config.upstream.exercise;
    let url = upstream_url(
        &exercise.base_url,
        "/exerciseinfo/",
        &[
            ("muscles", muscle_id.as_str()),
            ("language", exercise.language.as_str()),
            ("status", exercise.status.as_str()),
        ],
    );
    relay(state, url).await
}

/// First non-empty value of `key` in a raw query string
fn query_value(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// GET `url` and answer 200 with the upstream body, whatever status it had
async fn relay(
    state: &AppState,
    url: Result<url::Url, ForwardError>,
) -> Response<Full<Bytes>> {
    let result = match url {
        Ok(url) => forward(&state.client, ForwardRequest::get(url)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(upstream) => build_json_response(StatusCode::OK, upstream.body),
        Err(err @ ForwardError::Body { .. }) => {
            logger::log_error(&format!("exercise API: {err}"));
            build_api_error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_UPSTREAM_READ_FAILED)
        }
        Err(err) => {
            logger::log_upstream_failure(&state.config.upstream.exercise.base_url, &err);
            build_api_error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_UPSTREAM_CALL_FAILED)
        }
    }
}
