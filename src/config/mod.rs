//! Configuration module
//!
//! Loads layered configuration and holds the shared runtime state.

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::{AppState, StateError};
pub use types::{
    AuthBackendConfig, Config, CorsConfig, ExerciseApiConfig, HttpConfig, LoggingConfig,
    ServerConfig, StaticFilesConfig, UpstreamConfig,
};

pub const DEFAULT_CONFIG_PATH: &str = "config";

const WGER_API: &str = "https://wger.de/api/v2";
const SUPABASE_URL: &str = "https://egskxibwbafmruhnsiyd.supabase.co";
const SUPABASE_ANON_KEY: &str = "sb_publishable_45Yb6kMRPHZymtDcc7VaGg_Xq73NfxI";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("FITNESS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let cors = CorsConfig::default();
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.server_name", "fitness-proxy")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("cors.allow_origin", cors.allow_origin)?
            .set_default("cors.allow_methods", cors.allow_methods)?
            .set_default("cors.allow_headers", cors.allow_headers)?
            .set_default("upstream.timeout_secs", 0)?
            .set_default("upstream.exercise.base_url", WGER_API)?
            .set_default("upstream.exercise.language", "12")?
            .set_default("upstream.exercise.status", "2")?
            .set_default("upstream.auth.base_url", SUPABASE_URL)?
            .set_default("upstream.auth.api_key", SUPABASE_ANON_KEY)?
            .set_default("static_files.root", ".")?
            .set_default("static_files.index_file", "index.html")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config(exercise_base: &str, auth_base: &str, static_root: &str) -> Config {
    let mut cfg: Config = Config::defaults()
        .and_then(|builder| builder.build())
        .and_then(|settings| settings.try_deserialize())
        .expect("default config must deserialize");
    cfg.logging.access_log = false;
    cfg.upstream.exercise.base_url = exercise_base.to_string();
    cfg.upstream.auth.base_url = auth_base.to_string();
    cfg.static_files.root = static_root.to_string();
    cfg
}
