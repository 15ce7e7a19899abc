//! Configuration types
//!
//! Serde structures for every configuration section.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub static_files: StaticFilesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Cross-origin policy applied to every route
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
        }
    }
}

/// Upstream services the forwarders talk to
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub exercise: ExerciseApiConfig,
    pub auth: AuthBackendConfig,
    /// Client-wide request timeout in seconds, 0 disables it
    #[serde(default)]
    pub timeout_secs: u64,
}

/// Public exercise-data API (wger)
#[derive(Debug, Deserialize, Clone)]
pub struct ExerciseApiConfig {
    pub base_url: String,
    /// Fixed `language` filter appended to exercise lookups
    pub language: String,
    /// Fixed `status` filter appended to exercise lookups
    pub status: String,
}

/// Hosted authentication backend
#[derive(Debug, Deserialize, Clone)]
pub struct AuthBackendConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Static file serving
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    pub root: String,
    pub index_file: String,
}
