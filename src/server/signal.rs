// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
//
// Shutdown is published on a watch channel. The server loop stops accepting,
// and in-flight requests still waiting on the MIME table give up the wait.

use tokio::sync::watch;

use crate::logger;

/// Start signal handlers (Unix only)
///
/// Spawns a background task and returns the receiver that flips to true
/// on SIGTERM or SIGINT.
#[cfg(unix)]
pub fn start_signal_handler() -> watch::Receiver<bool> {
    use tokio::signal::unix::{signal, SignalKind};

    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("Failed to register signal handlers: {e}"));
                    // Keep the sender alive so the server is not stopped
                    std::future::pending().await
                }
            };

        tokio::select! {
            _ = sigterm.recv() => logger::log_shutdown_requested("SIGTERM"),
            _ = sigint.recv() => logger::log_shutdown_requested("SIGINT"),
        }
        let _ = tx.send(true);
        // Hold the sender so receivers keep seeing the final value
        std::future::pending::<()>().await;
    });

    rx
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_shutdown_requested("Ctrl+C");
            let _ = tx.send(true);
        }
        std::future::pending::<()>().await;
    });

    rx
}
