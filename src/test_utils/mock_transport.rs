use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    error::{DecodeError, TransportError},
    transport::Transport,
    types::{BlockHash, BlockMetadata, EventId, EventPayload, RawResult, TransportItem},
};

/// Chain id reported in the metadata of blocks pushed through [`MockTransportHandle`].
pub const MOCK_CHAIN_ID: &str = "mock-chain";

#[derive(Debug, Default)]
struct Calls {
    subscribed: Vec<String>,
    unsubscribed: Vec<String>,
    rejected: HashSet<String>,
}

#[derive(Debug)]
struct Shared {
    results: Mutex<Option<mpsc::UnboundedSender<TransportItem>>>,
    calls: Mutex<Calls>,
    stopped: AtomicBool,
    stop_calls: AtomicUsize,
    next_height: AtomicU64,
}

impl Shared {
    fn calls(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close_results(&self) {
        self.results.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// In-memory [`Transport`] driven by a [`MockTransportHandle`].
///
/// Items pushed through the handle are delivered in order. Subscribe and unsubscribe calls are
/// recorded, and topics can be made to fail with [`MockTransportHandle::reject`].
#[derive(Debug)]
pub struct MockTransport {
    results: Mutex<Option<UnboundedReceiverStream<TransportItem>>>,
    errors: Mutex<mpsc::UnboundedReceiver<TransportError>>,
    shared: Arc<Shared>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> (Self, MockTransportHandle) {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            results: Mutex::new(Some(results_tx)),
            calls: Mutex::new(Calls::default()),
            stopped: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
            next_height: AtomicU64::new(1),
        });

        let transport = Self {
            results: Mutex::new(Some(UnboundedReceiverStream::new(results_rx))),
            errors: Mutex::new(errors_rx),
            shared: Arc::clone(&shared),
        };
        let handle = MockTransportHandle { errors: errors_tx, shared };

        (transport, handle)
    }

    fn request(&self, topic: &str) -> Result<(), TransportError> {
        if self.shared.stopped.load(Ordering::Acquire) {
            return Err(TransportError::Stopped);
        }
        if self.shared.calls().rejected.contains(topic) {
            return Err(TransportError::Rejected(topic.to_owned()));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    type Results = UnboundedReceiverStream<TransportItem>;

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.request(topic)?;
        self.shared.calls().subscribed.push(topic.to_owned());
        Ok(())
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<(), TransportError> {
        self.request(subscription_id)?;
        self.shared.calls().unsubscribed.push(subscription_id.to_owned());
        Ok(())
    }

    fn take_results(&mut self) -> Option<Self::Results> {
        self.results.get_mut().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn try_next_error(&self) -> Option<TransportError> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).try_recv().ok()
    }

    fn stop(&self) {
        self.shared.stop_calls.fetch_add(1, Ordering::AcqRel);
        if !self.shared.stopped.swap(true, Ordering::AcqRel) {
            self.shared.close_results();
        }
    }
}

/// Feeds and inspects a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    errors: mpsc::UnboundedSender<TransportError>,
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    /// Pushes a raw item onto the result stream. Ignored once the stream is closed.
    pub fn push(&self, item: TransportItem) {
        let results = self.shared.results.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(results) = results.as_ref() {
            let _ = results.send(item);
        }
    }

    /// Pushes a block notification with the next height.
    pub fn push_block(&self, hash: impl Into<BlockHash>) {
        let height = self.shared.next_height.fetch_add(1, Ordering::AcqRel);
        let metadata = BlockMetadata { height, chain_id: MOCK_CHAIN_ID.to_owned(), num_txs: 0 };
        self.push(Ok(RawResult::new_block(hash, metadata)));
    }

    pub fn push_event(&self, topic: impl Into<EventId>, payload: impl Into<EventPayload>) {
        self.push(Ok(RawResult::event(topic, payload)));
    }

    pub fn push_decode_error(&self, reason: impl Into<String>) {
        self.push(Err(DecodeError::new(reason)));
    }

    pub fn push_unrecognized(&self, kind: impl Into<String>) {
        self.push(Ok(RawResult::Unrecognized { kind: kind.into() }));
    }

    /// Reports an error on the transport's error side channel.
    pub fn push_transport_error(&self, error: TransportError) {
        let _ = self.errors.send(error);
    }

    /// Ends the result stream, as a dropped connection would.
    pub fn close_results(&self) {
        self.shared.close_results();
    }

    /// Makes subscribe and unsubscribe calls for `topic` fail from now on.
    pub fn reject(&self, topic: impl Into<String>) {
        self.shared.calls().rejected.insert(topic.into());
    }

    /// Topics passed to successful subscribe calls, in call order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared.calls().subscribed.clone()
    }

    /// Ids passed to successful unsubscribe calls, in call order.
    #[must_use]
    pub fn unsubscriptions(&self) -> Vec<String> {
        self.shared.calls().unsubscribed.clone()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Number of times `stop` was called.
    #[must_use]
    pub fn stop_calls(&self) -> usize {
        self.shared.stop_calls.load(Ordering::Acquire)
    }
}
