//! The pub/sub adapter a tracker consumes.
//!
//! Connection management, frame I/O and wire decoding all live behind [`Transport`]. The
//! tracker only needs decoded [`TransportItem`]s in arrival order, a way to (un)subscribe, and a
//! side channel it can poll for transport-level failures.

use std::future::Future;

use tokio_stream::Stream;

use crate::{error::TransportError, types::TransportItem};

pub trait Transport: Send + Sync + 'static {
    /// Stream of decoded results. Lazy, possibly infinite, and not restartable; the stream
    /// ending means the adapter is closed.
    type Results: Stream<Item = TransportItem> + Send + Unpin + 'static;

    /// Subscribes to `topic` on the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or the connection rejects the request.
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Cancels a previous subscription.
    ///
    /// Subscriptions are identified by the topic they were made with, so `subscription_id` is
    /// the string previously passed to [`subscribe`](Self::subscribe).
    ///
    /// # Errors
    ///
    /// Returns an error if the node or the connection rejects the request.
    fn unsubscribe(
        &self,
        subscription_id: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Hands out the result stream. Returns `None` once it has been taken.
    fn take_results(&mut self) -> Option<Self::Results>;

    /// Returns the next pending transport-level error without waiting.
    fn try_next_error(&self) -> Option<TransportError>;

    /// Stops the adapter. Calling it more than once has no further effect.
    fn stop(&self);
}
