//! Server lifecycle
//!
//! Graceful shutdown waits for in-flight requests, but never longer than
//! the configured drain timeout.

use std::{
    future::{Future, IntoFuture},
    sync::Arc,
    time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};

/// Serve `app` until `signal` resolves and open connections drain
///
/// Connections still open `drain_timeout` after the signal are dropped.
///
/// # Errors
///
/// Returns the I/O error if the server fails while running.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        signal.await;
        notify.notify_one();
    });

    tokio::select! {
        result = server.into_future() => result,
        () = async {
            signalled.notified().await;
            info!("Waiting up to {:?} for connections to close...", drain_timeout);
            tokio::time::sleep(drain_timeout).await;
        } => {
            warn!("Connections still open after {:?}, forcing shutdown", drain_timeout);
            Ok(())
        }
    }
}
