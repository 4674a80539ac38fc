use anyhow::Result;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wait for termination signals (Ctrl+C, SIGTERM)
pub async fn wait_for_shutdown() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c().await.inspect_err(|e| {
            tracing::error!(%e, "Failed to install Ctrl+C handler");
        })
    };

    #[cfg(unix)]
    let terminate = async {
        let mut handler = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| tracing::error!(%e, "Failed to install SIGTERM handler"))?;
        handler.recv().await;
        Ok::<(), std::io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            tracing::info!("Received Ctrl+C signal");
        },
        result = terminate => {
            result?;
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, initiating graceful shutdown");
    Ok(())
}

/// Cancel `cancel` once a termination signal arrives.
///
/// Falls back to plain Ctrl+C when the signal handlers cannot be installed.
pub fn cancel_on_shutdown(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = wait_for_shutdown() => {
                if let Err(e) = result {
                    tracing::warn!(
                        error = %e,
                        "shutdown: primary waiter failed; falling back to ctrl_c()"
                    );
                    let _ = signal::ctrl_c().await;
                }
            }
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    })
}
