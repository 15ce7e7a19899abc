//! HTTP protocol layer module
//!
//! Response builders, MIME detection, conditional GET and the middleware
//! chain, shared by the forwarders and the static file server.

pub mod cache;
pub mod cors;
pub mod middleware;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cors::Cors;
pub use middleware::Middleware;
pub use response::{
    build_304_response, build_404_response, build_413_response,
    build_api_error_response, build_empty_response, build_error_response, build_file_response,
    build_json_response,
};
