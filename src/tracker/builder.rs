use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    error::TrackerError,
    tracker::{
        ConfirmationTracker,
        consumer::Consumer,
        wait::TrackerState,
    },
    transport::Transport,
    types::EventId,
};

/// Default bound on how long [`ConfirmationTracker::close`] waits for the consumption loop.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Only one wait may be outstanding, so a single queued registration is enough.
const COMMAND_BUFFER_CAPACITY: usize = 1;

/// Builder for a [`ConfirmationTracker`].
#[derive(Debug, Clone)]
pub struct ConfirmationTrackerBuilder {
    event_id: EventId,
    shutdown_timeout: Duration,
    subscribe_on_connect: bool,
    subscribe_new_blocks: bool,
}

impl ConfirmationTrackerBuilder {
    /// Creates a builder for a tracker bound to `event_id`.
    #[must_use]
    pub fn new(event_id: impl Into<EventId>) -> Self {
        Self {
            event_id: event_id.into(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            subscribe_on_connect: true,
            subscribe_new_blocks: true,
        }
    }

    /// Sets how long [`close`](ConfirmationTracker::close) waits for the consumption loop to
    /// resolve outstanding waits before aborting it.
    ///
    /// Default is [`DEFAULT_SHUTDOWN_TIMEOUT`].
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Whether `connect` subscribes to the tracked event id. Enabled by default.
    #[must_use]
    pub fn subscribe_on_connect(mut self, enabled: bool) -> Self {
        self.subscribe_on_connect = enabled;
        self
    }

    /// Whether `connect` subscribes to [`EventId::new_block`]. Enabled by default.
    ///
    /// Without block notifications no event is ever confirmed, so only disable this when the
    /// transport already delivers them.
    #[must_use]
    pub fn subscribe_new_blocks(mut self, enabled: bool) -> Self {
        self.subscribe_new_blocks = enabled;
        self
    }

    fn initial_topics(&self) -> Vec<EventId> {
        let mut topics = Vec::with_capacity(2);
        if self.subscribe_new_blocks {
            topics.push(EventId::new_block());
        }
        if self.subscribe_on_connect && !topics.contains(&self.event_id) {
            topics.push(self.event_id.clone());
        }
        topics
    }

    /// Takes ownership of `transport`, performs the initial subscriptions and starts the
    /// consumption loop.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::ResultsUnavailable`] - if the transport's result stream was already
    ///   taken.
    /// * [`TrackerError::Subscription`] - if an initial subscription is rejected. The transport
    ///   is stopped in that case.
    pub async fn connect<T: Transport>(
        self,
        mut transport: T,
    ) -> Result<ConfirmationTracker<T>, TrackerError> {
        let results = transport.take_results().ok_or(TrackerError::ResultsUnavailable)?;
        let transport = Arc::new(transport);

        let mut subscriptions = BTreeSet::new();
        for topic in self.initial_topics() {
            if let Err(err) = transport.subscribe(topic.as_str()).await {
                error!(topic = %topic, error = %err, "Initial subscription failed");
                transport.stop();
                return Err(TrackerError::Subscription(err));
            }
            subscriptions.insert(topic);
        }

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER_CAPACITY);
        let (block_hash_tx, block_hash_rx) = watch::channel(None);
        let state = Arc::new(TrackerState::default());
        let shutdown = CancellationToken::new();

        let consumer = Consumer {
            event_id: self.event_id.clone(),
            results,
            commands: commands_rx,
            block_hash: block_hash_tx,
            state: Arc::clone(&state),
            shutdown: shutdown.clone(),
            latest_block: None,
            pending: None,
        };
        let handle = tokio::spawn(consumer.run());

        info!(event_id = %self.event_id, "Confirmation tracker started");

        Ok(ConfirmationTracker {
            event_id: self.event_id,
            transport,
            commands: commands_tx,
            state,
            latest_block: block_hash_rx,
            subscriptions: Mutex::new(subscriptions),
            shutdown,
            consumer: Mutex::new(Some(handle)),
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}
