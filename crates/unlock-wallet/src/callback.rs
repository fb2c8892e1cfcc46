//! Adapters for collaborators that take callbacks instead of awaiting.

use std::future::Future;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use unlock_wallet_core::{GatewayError, GatewayEvent};

/// Awaits `operation` and hands its outcome to `callback`.
pub async fn with_callback<T, Fut, F>(operation: Fut, callback: F)
where
    Fut: Future<Output = Result<T, GatewayError>>,
    F: FnOnce(Result<T, GatewayError>),
{
    callback(operation.await);
}

/// Delivers every event from `events` to `listener` until the bus closes.
pub fn forward_events<F>(mut events: broadcast::Receiver<GatewayEvent>, mut listener: F) -> JoinHandle<()>
where
    F: FnMut(GatewayEvent) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => listener(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
