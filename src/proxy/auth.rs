//! Authentication forwarder
//!
//! Signup and login are relayed to the hosted auth backend with its API key;
//! logout is answered locally since no session lives here.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderName;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::forwarder::{forward, upstream_url, ForwardError, ForwardRequest};
use crate::config::AppState;
use crate::http::{build_api_error_response, build_json_response};
use crate::logger;

pub const MSG_INVALID_DATA: &str = "Données invalides";
pub const MSG_SIGNUP_FAILED: &str = "Erreur lors de l'inscription";
pub const MSG_LOGIN_FAILED: &str = "Erreur lors de la connexion";
pub const LOGOUT_BODY: &str = r#"{"message":"Déconnecté avec succès"}"#;

const API_KEY_HEADER: &str = "apikey";

/// Login/signup payload, re-serialized as-is for the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Which backend operation a credentials call maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Signup,
    Login,
}

impl AuthAction {
    const fn path(self) -> &'static str {
        match self {
            Self::Signup => "/auth/v1/signup",
            Self::Login => "/auth/v1/token",
        }
    }

    const fn query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Signup => &[],
            Self::Login => &[("grant_type", "password")],
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Signup => MSG_SIGNUP_FAILED,
            Self::Login => MSG_LOGIN_FAILED,
        }
    }
}

/// Register a new account
pub async fn signup(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    relay_credentials(state, AuthAction::Signup, body).await
}

/// Exchange email/password for a token
pub async fn login(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    relay_credentials(state, AuthAction::Login, body).await
}

/// Always succeeds; token invalidation is up to the client and the backend
pub fn logout() -> Response<Full<Bytes>> {
    build_json_response(StatusCode::OK, Bytes::from_static(LOGOUT_BODY.as_bytes()))
}

async fn relay_credentials(
    state: &AppState,
    action: AuthAction,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let credentials = match serde_json::from_slice::<Credentials>(body) {
        Ok(c) => c,
        Err(e) => {
            logger::log_warning(&format!("rejected {action:?} payload: {e}"));
            return build_api_error_response(StatusCode::BAD_REQUEST, MSG_INVALID_DATA);
        }
    };

    let result = match build_request(state, action, &credentials) {
        Ok(req) => forward(&state.client, req).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(upstream) => build_json_response(upstream.status, upstream.body),
        // The backend did answer: keep its status even without a body
        Err(ForwardError::Body { status, source }) => {
            logger::log_warning(&format!("auth backend body unreadable: {source}"));
            build_json_response(status, Bytes::new())
        }
        Err(err) => {
            logger::log_upstream_failure(&state.config.upstream.auth.base_url, &err);
            build_api_error_response(StatusCode::INTERNAL_SERVER_ERROR, action.failure_message())
        }
    }
}

fn build_request(
    state: &AppState,
    action: AuthAction,
    credentials: &Credentials,
) -> Result<ForwardRequest, ForwardError> {
    let auth = &state.config.upstream.auth;
    let url = upstream_url(&auth.base_url, action.path(), action.query())?;
    // Credentials is two plain strings, serialization cannot fail
    let payload = serde_json::to_vec(credentials).unwrap_or_default();

    Ok(ForwardRequest::post_json(url, payload).header(
        HeaderName::from_static(API_KEY_HEADER),
        state.auth_api_key.clone(),
    ))
}
