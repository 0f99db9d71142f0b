//! Serving the router with a bounded graceful shutdown.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::AppError;

/// Serve until `shutdown` resolves, then drain in-flight requests.
///
/// Returns [`AppError::ShutdownTimeout`] if draining takes longer than `grace`.
pub async fn serve_until<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let deadline = async move {
        // Sender dropped without a signal means the server stopped on its own.
        if signalled_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result?;
            info!("Process terminated");
            Ok(())
        }
        _ = deadline => {
            warn!("In-flight requests still running after {:?}, forcing exit", grace);
            Err(AppError::ShutdownTimeout(grace))
        }
    }
}
