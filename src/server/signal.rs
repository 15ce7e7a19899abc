//! Signal handling
//!
//! SIGTERM and SIGINT (Ctrl+C) both request a graceful shutdown.

/// Resolve once a shutdown signal arrives, yielding the signal's name
///
/// Falls back to Ctrl+C only when the SIGTERM handler cannot be registered.
#[cfg(unix)]
pub async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            crate::logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        name = ctrl_c() => name,
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        crate::logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        // Without a handler the server runs until killed
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
