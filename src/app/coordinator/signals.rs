//! Signal handling for graceful shutdown
//!
//! CTRL-C and SIGTERM cancel the run-scoped token. The engine notices at the
//! next file boundary or while a body is streaming, cleans up the in-flight
//! temporary file and still prints its summary.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels a run when the process is asked to stop
pub struct SignalHandler {
    cancel: CancellationToken,
}

impl SignalHandler {
    /// Create a signal handler that cancels `cancel`
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Spawn the background task watching for CTRL-C and SIGTERM
    ///
    /// The task also exits quietly if the token is cancelled by someone else.
    pub fn setup(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received Ctrl+C, stopping after cleanup");
                },
                _ = terminate => {
                    info!("Received terminate signal, stopping after cleanup");
                },
                _ = cancel.cancelled() => return,
            }

            cancel.cancel();
        })
    }
}
