//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;
use hyper::{Request, Response, Version};
use std::net::SocketAddr;
use std::time::Duration;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one request/response cycle
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    pub http_version: &'static str,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// `Origin` header, present on cross-origin calls
    pub origin: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Capture the request side of the entry, timestamped now
    pub fn from_request<B>(req: &Request<B>, remote_addr: SocketAddr) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            remote_addr: remote_addr.ip().to_string(),
            time: Local::now(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            http_version: version_str(req.version()),
            status: 0,
            body_bytes: 0,
            referer: header("referer"),
            user_agent: header("user-agent"),
            origin: header("origin"),
            request_time_us: 0,
        }
    }

    /// Fill in the response side once the handler is done
    pub fn complete<B>(&mut self, resp: &Response<B>, body_bytes: usize, elapsed: Duration) {
        self.status = resp.status().as_u16();
        self.body_bytes = body_bytes;
        self.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.method,
            self.request_uri(),
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "origin": self.origin,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time`
    /// (seconds, 3 decimals), `$status`, `$body_bytes_sent`, `$http_referer`,
    /// `$http_user_agent`, `$http_origin`.
    fn format_custom(&self, pattern: &str) -> String {
        let request_uri = self.request_uri();
        let request_line = format!("{} {request_uri} HTTP/{}", self.method, self.http_version);
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // Longer names first: $request_time and $request_uri before $request
        let substitutions = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", request_uri),
            ("$request", request_line),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", or_dash(self.referer.as_deref())),
            ("$http_user_agent", or_dash(self.user_agent.as_deref())),
            ("$http_origin", or_dash(self.origin.as_deref())),
        ];

        substitutions
            .iter()
            .fold(pattern.to_string(), |acc, (var, value)| acc.replace(var, value))
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let req = Request::builder()
            .method("GET")
            .uri("/api/exercises?muscle=2")
            .header("referer", "https://example.com")
            .header("user-agent", "Mozilla/5.0")
            .header("origin", "http://localhost:3000")
            .body(())
            .unwrap();
        let mut entry = AccessLogEntry::from_request(&req, "192.168.1.1:5555".parse().unwrap());
        let resp = Response::builder().status(200).body(()).unwrap();
        entry.complete(&resp, 1234, Duration::from_micros(1_250_000));
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"GET /api/exercises?muscle=2 HTTP/1.1\" 200 1234"));
        assert!(log.ends_with("\"https://example.com\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.contains("GET /api/exercises?muscle=2 HTTP/1.1"));
        assert!(log.ends_with("200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "192.168.1.1");
        assert_eq!(value["query"], "muscle=2");
        assert_eq!(value["status"], 200);
        assert_eq!(value["origin"], "http://localhost:3000");
        assert_eq!(value["request_time_us"], 1_250_000);
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$request_method $request_uri $status $request_time $http_origin");
        assert_eq!(log, "GET /api/exercises?muscle=2 200 1.250 http://localhost:3000");
    }

    #[test]
    fn test_missing_headers_render_as_dash() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let entry = AccessLogEntry::from_request(&req, "127.0.0.1:1".parse().unwrap());
        assert_eq!(entry.format("$http_referer|$http_origin"), "-|-");
    }
}
