//! Logger module
//!
//! Startup banner, one access line per request, and warnings for rejected
//! input and failed upstream calls. Lines go to stdout/stderr unless log
//! files are configured.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Open the configured log targets; call once before serving
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let upstream = &config.upstream;
    let lines = [
        format!("fitness-proxy listening on http://{addr}"),
        format!("  exercise API  {}", upstream.exercise.base_url),
        format!("  auth backend  {}", upstream.auth.base_url),
        format!("  static root   {}", config.static_files.root),
        format!("  log level     {}", config.logging.level),
    ];
    for line in &lines {
        write_info(line);
    }

    if upstream.timeout_secs > 0 {
        write_info(&format!("  upstream timeout  {}s", upstream.timeout_secs));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("  worker threads  {workers}"));
    }
    for (kind, path) in [
        ("access log", &config.logging.access_log_file),
        ("error log", &config.logging.error_log_file),
    ] {
        if let Some(path) = path {
            write_info(&format!("  {kind}  {path}"));
        }
    }
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log a failed upstream call; the detail stays in the log, never in the response
pub fn log_upstream_failure(url: &str, err: &impl std::fmt::Display) {
    write_error(&format!("[UPSTREAM] {url}: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    match writer::get() {
        Some(w) => w.write_access(&entry.format(format)),
        None => println!("{}", entry.format(format)),
    }
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[SIGNAL] {signal} received, shutting down"));
}
