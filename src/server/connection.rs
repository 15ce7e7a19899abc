//! Connection handling
//!
//! Serves one accepted TCP connection in its own task.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Serve a connection in a spawned task.
///
/// The active connection counter is incremented before spawning and
/// decremented when the connection closes. Once `shutdown` changes the
/// connection finishes its in-flight request and closes.
pub fn spawn_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    conn_counter.fetch_add(1, Ordering::SeqCst);
    let state = Arc::clone(state);
    let conn_counter = Arc::clone(conn_counter);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let mut builder = http1::Builder::new();
        builder.keep_alive(true);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| serve_request(req, peer_addr, Arc::clone(&state))),
        );
        tokio::pin!(conn);

        let mut stopping = false;
        let result = loop {
            tokio::select! {
                res = conn.as_mut() => break res,
                _ = shutdown.changed(), if !stopping => {
                    conn.as_mut().graceful_shutdown();
                    stopping = true;
                }
            }
        };
        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Run the request through the router, writing the access log line afterwards
async fn serve_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
    if !state.config.logging.access_log {
        return handler::handle_request(req, state).await;
    }

    let started = Instant::now();
    let mut entry = AccessLogEntry::from_request(&req, peer_addr);
    let resp = handler::handle_request(req, Arc::clone(&state)).await?;

    let body_bytes = resp
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.complete(&resp, body_bytes, started.elapsed());
    logger::log_access(&entry, &state.config.logging.access_log_format);

    Ok(resp)
}
