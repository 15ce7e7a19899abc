//! Application state module
//!
//! Immutable per-process state shared by every connection.

use std::time::Duration;

use hyper::header::{HeaderValue, InvalidHeaderValue};
use thiserror::Error;

use super::types::Config;
use crate::http::Cors;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] InvalidHeaderValue),

    #[error("upstream.auth.api_key is not a valid header value: {0}")]
    ApiKey(#[source] InvalidHeaderValue),
}

/// Application state
pub struct AppState {
    pub config: Config,
    /// Pooled client used for every upstream call
    pub client: reqwest::Client,
    pub cors: Cors,
    /// `apikey` header value sent to the auth backend
    pub auth_api_key: HeaderValue,
}

impl AppState {
    /// Build state from loaded configuration.
    ///
    /// The upstream client only gets a timeout when `upstream.timeout_secs`
    /// is positive; by default a slow upstream holds the request.
    pub fn new(config: &Config) -> Result<Self, StateError> {
        let mut builder = reqwest::Client::builder();
        if config.upstream.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.upstream.timeout_secs));
        }

        Ok(Self {
            config: config.clone(),
            client: builder.build()?,
            cors: Cors::from_config(&config.cors)?,
            auth_api_key: HeaderValue::from_str(&config.upstream.auth.api_key)
                .map_err(StateError::ApiKey)?,
        })
    }
}
