//! The confirmation tracker and its consumption loop.

mod builder;
mod classify;
mod consumer;
pub(crate) mod wait;

use std::{
    collections::BTreeSet,
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

pub use builder::{ConfirmationTrackerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use wait::ConfirmationReceiver;

use crate::{
    error::TrackerError,
    transport::Transport,
    types::{BlockHash, EventId},
};
use consumer::Command;
use wait::{PendingWait, TrackerState};

/// Resolves confirmations for one event id from a [`Transport`]'s result stream.
///
/// Created with [`ConfirmationTrackerBuilder`]. A background task consumes the transport's
/// results for as long as the tracker lives; [`wait_for_confirmation`] registers interest in
/// the next qualifying event and returns a receiver that resolves exactly once.
///
/// # Example
///
/// ```no_run
/// # use confirmation_tracker::{ConfirmationTrackerBuilder, EventId, Transport};
/// # async fn example(transport: impl Transport, sender: alloy::primitives::Address)
/// # -> Result<(), Box<dyn std::error::Error>> {
/// let event_id = EventId::account_input(sender);
/// let tracker = ConfirmationTrackerBuilder::new(event_id.clone()).connect(transport).await?;
///
/// let receiver = tracker.wait_for_confirmation(event_id)?;
/// // ... broadcast the transaction ...
/// match receiver.await {
///     Ok(confirmed) => println!("included in block {}", confirmed.block_hash),
///     Err(err) => eprintln!("not confirmed: {err}"),
/// }
///
/// tracker.close().await;
/// # Ok(())
/// # }
/// ```
///
/// [`wait_for_confirmation`]: ConfirmationTracker::wait_for_confirmation
pub struct ConfirmationTracker<T: Transport> {
    event_id: EventId,
    transport: Arc<T>,
    commands: mpsc::Sender<Command>,
    state: Arc<TrackerState>,
    latest_block: watch::Receiver<Option<BlockHash>>,
    subscriptions: Mutex<BTreeSet<EventId>>,
    shutdown: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl<T: Transport> ConfirmationTracker<T> {
    /// The event id this tracker is bound to.
    #[must_use]
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Subscribes to `event_id` through the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Subscription`] if the transport rejects the request.
    pub async fn subscribe(&self, event_id: impl Into<EventId>) -> Result<(), TrackerError> {
        let event_id = event_id.into();
        self.transport.subscribe(event_id.as_str()).await.map_err(|err| {
            warn!(topic = %event_id, error = %err, "Subscribe failed");
            TrackerError::Subscription(err)
        })?;

        debug!(topic = %event_id, "Subscribed");
        self.lock_subscriptions().insert(event_id);
        Ok(())
    }

    /// Cancels a subscription through the transport.
    ///
    /// `subscription_id` is the topic the subscription was made with. It is removed from
    /// [`subscriptions`](Self::subscriptions) once the transport accepts the request.
    ///
    /// Safe to call while a wait is outstanding: the consumption loop is not involved, and a
    /// confirmation that is already being delivered is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Subscription`] if the transport rejects the request.
    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<(), TrackerError> {
        self.transport.unsubscribe(subscription_id).await.map_err(|err| {
            warn!(subscription_id = %subscription_id, error = %err, "Unsubscribe failed");
            TrackerError::Subscription(err)
        })?;

        debug!(subscription_id = %subscription_id, "Unsubscribed");
        self.lock_subscriptions().retain(|topic| topic != subscription_id);
        Ok(())
    }

    /// Topics currently recorded as subscribed, in sorted order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<EventId> {
        self.lock_subscriptions().iter().cloned().collect()
    }

    /// Registers a wait for the next confirmation of `event_id`.
    ///
    /// Returns immediately. The returned receiver resolves exactly once: with the matching
    /// transaction event and the latest block hash, with
    /// [`ConfirmationError::UnexpectedPayloadShape`](crate::ConfirmationError::UnexpectedPayloadShape)
    /// if the tracked topic carries another payload, or with a closed error if the tracker or
    /// transport stops first.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::Closed`] - if the tracker was closed or the transport stream ended.
    /// * [`TrackerError::EventIdMismatch`] - if `event_id` is not the tracked event id.
    /// * [`TrackerError::WaitInProgress`] - if another wait is still outstanding.
    pub fn wait_for_confirmation(
        &self,
        event_id: impl Into<EventId>,
    ) -> Result<ConfirmationReceiver, TrackerError> {
        let event_id = event_id.into();

        if self.state.is_closed() {
            return Err(TrackerError::Closed);
        }
        if event_id != self.event_id {
            return Err(TrackerError::EventIdMismatch {
                requested: event_id,
                tracked: self.event_id.clone(),
            });
        }
        if !self.state.try_reserve_wait() {
            return Err(TrackerError::WaitInProgress);
        }

        let (wait, receiver) = PendingWait::new(event_id);
        if let Err(err) = self.commands.try_send(Command::Wait(wait)) {
            self.state.release_wait();
            return Err(match err {
                TrySendError::Closed(_) => TrackerError::Closed,
                TrySendError::Full(_) => TrackerError::WaitInProgress,
            });
        }

        Ok(receiver)
    }

    /// The most recent block hash observed by the consumption loop, if any.
    #[must_use]
    pub fn latest_block_hash(&self) -> Option<BlockHash> {
        self.latest_block.borrow().clone()
    }

    /// Subscribes to updates of the latest block hash.
    #[must_use]
    pub fn watch_block_hash(&self) -> watch::Receiver<Option<BlockHash>> {
        self.latest_block.clone()
    }

    /// Returns `true` once the tracker has been closed or its transport stream has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Reports the next pending transport-level error, without waiting.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::Closed`] - if the tracker is closed.
    /// * [`TrackerError::Transport`] - if the transport has reported an error.
    pub fn check_health(&self) -> Result<(), TrackerError> {
        if self.state.is_closed() {
            return Err(TrackerError::Closed);
        }
        match self.transport.try_next_error() {
            Some(err) => Err(TrackerError::Transport(err)),
            None => Ok(()),
        }
    }

    /// Stops the consumption loop and the transport.
    ///
    /// An outstanding wait is resolved with
    /// [`ConfirmationError::TrackerClosed`](crate::ConfirmationError::TrackerClosed). Waits at
    /// most the configured shutdown timeout for the loop before aborting it; receivers of an
    /// aborted loop also resolve to `TrackerClosed`. Calling `close` again has no effect.
    pub async fn close(&self) {
        self.shutdown.cancel();

        let consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = consumer {
            let abort = handle.abort_handle();
            match timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "Consumption loop failed"),
                Err(_) => {
                    warn!(
                        timeout_ms = self.shutdown_timeout.as_millis(),
                        "Consumption loop did not stop in time, aborting"
                    );
                    abort.abort();
                }
            }
        }

        self.state.mark_closed();
        self.transport.stop();
        info!(event_id = %self.event_id, "Confirmation tracker closed");
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, BTreeSet<EventId>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Drop for ConfirmationTracker<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.transport.stop();
    }
}

impl<T: Transport> fmt::Debug for ConfirmationTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationTracker")
            .field("event_id", &self.event_id)
            .field("closed", &self.state.is_closed())
            .field("latest_block", &*self.latest_block.borrow())
            .finish_non_exhaustive()
    }
}
