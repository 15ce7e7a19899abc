//! Server module
//!
//! Accept loop, per-connection tasks and graceful shutdown.

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::AppState;
use crate::logger;
use connection::spawn_connection;

pub use listener::create_listener;
pub use signal::shutdown_signal;

/// How long open connections get to finish once shutdown starts
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves, then drain.
///
/// After the shutdown future yields, the listener is closed, open
/// connections are told to finish their current request, and the call
/// returns once they are all gone or [`DRAIN_TIMEOUT`] has elapsed.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => spawn_connection(
                        stream,
                        peer_addr,
                        &state,
                        &active_connections,
                        stop_rx.clone(),
                    ),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                break;
            }
        }
    }

    drop(listener);
    // Receivers never all drop while tasks hold clones, a send error is harmless
    let _ = stop_tx.send(true);
    drain(&active_connections).await;
}

async fn drain(active_connections: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_info("All connections closed");
            return;
        }

        tokio::select! {
            () = tokio::time::sleep(DRAIN_POLL) => {}
            () = tokio::time::sleep_until(deadline) => {
                logger::log_warning(&format!(
                    "Drain timeout after {}s, {remaining} connection(s) still open",
                    DRAIN_TIMEOUT.as_secs()
                ));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::proxy::auth::LOGOUT_BODY;
    use crate::proxy::test_support::dead_base;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serves_requests_and_stops_on_signal() {
        let dead = dead_base();
        let state = Arc::new(AppState::new(&test_config(&dead, &dead, ".")).unwrap());
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
            "TEST"
        }));

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://{addr}/api/auth/logout"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.headers()["server"], "fitness-proxy");
        assert_eq!(resp.text().await.unwrap(), LOGOUT_BODY);

        // Keep-alive connection from the client must not hold the drain open
        tx.send(()).unwrap();
        tokio::time::timeout(DRAIN_TIMEOUT + Duration::from_secs(1), server)
            .await
            .unwrap()
            .unwrap();

        assert!(client
            .get(format!("http://{addr}/api/muscles"))
            .send()
            .await
            .is_err());
    }
}
