use std::future::Future;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};

use crate::Error::ShutdownTimeout;
use crate::Result;

/// How long a stopping server gets to drain in-flight requests.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// SIGINT/SIGTERM as a stream. The handler is process-wide and can only be
/// installed once.
pub fn signals() -> Result<impl Stream<Item = ()> + Unpin> {
    let (tx, rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    Ok(UnboundedReceiverStream::new(rx))
}

/// A stop trigger for the server and the receiving side to hand to it.
pub fn stop_channel() -> (oneshot::Sender<()>, impl Future<Output = ()> + Send + 'static) {
    let (tx, rx) = oneshot::channel::<()>();
    (tx, async move {
        let _ = rx.await;
    })
}

/// Run the server and the signal listener together until either one ends.
///
/// A signal stops the server and gives it [`SHUTDOWN_GRACE`] to finish; a
/// server that outlives that is a fatal error. A server that exits on its
/// own ends the run without waiting for a signal.
pub async fn run<S, F>(server: F, stop: oneshot::Sender<()>, mut signals: S) -> Result<()>
where
    S: Stream<Item = ()> + Unpin,
    F: Future<Output = ()> + Send + 'static,
{
    let mut server = tokio::spawn(server);

    tokio::select! {
        _ = signals.next() => {
            info!("caught interrupt");
        }
        _ = &mut server => {
            warn!("server closed unexpectedly");
            return Ok(());
        }
    }

    info!("shutting down server");
    let _ = stop.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(_) => Ok(()),
        Err(_) => Err(ShutdownTimeout(SHUTDOWN_GRACE)),
    }
}
