//! Fitness proxy
//!
//! Serves the fitness web front-end and relays its API calls to the public
//! exercise API and the hosted auth backend, adding CORS headers throughout.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod server;
