use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    error::ConfirmationError,
    tracker::{
        classify::{Skip, Verdict, classify},
        wait::{PendingWait, TrackerState},
    },
    types::{BlockHash, Confirmation, EventId, TransportItem},
};

pub(crate) enum Command {
    Wait(PendingWait),
}

/// The single task that reads a transport's result stream.
///
/// It is the only writer of the latest block hash and the only writer to a pending wait, so
/// neither needs a lock. Other tasks observe the block hash through a [`watch`] channel.
pub(crate) struct Consumer<S> {
    pub(crate) event_id: EventId,
    pub(crate) results: S,
    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) block_hash: watch::Sender<Option<BlockHash>>,
    pub(crate) state: Arc<TrackerState>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) latest_block: Option<BlockHash>,
    pub(crate) pending: Option<PendingWait>,
}

impl<S: Stream<Item = TransportItem> + Unpin> Consumer<S> {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(event_id = %self.event_id))
    )]
    pub(crate) async fn run(mut self) {
        let reason = loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    info!("Shutdown requested, stopping consumption loop");
                    break ConfirmationError::TrackerClosed;
                }
                Some(command) = self.commands.recv() => self.handle_command(command),
                () = abandoned(&mut self.pending), if self.pending.is_some() => {
                    debug!("Caller dropped its receiver, releasing wait");
                    self.pending = None;
                    self.state.release_wait();
                }
                item = self.results.next() => match item {
                    Some(item) => self.handle_item(item),
                    None => {
                        warn!("Transport result stream ended, stopping consumption loop");
                        break ConfirmationError::TransportClosed;
                    }
                },
            }
        };

        self.finish(&reason);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Wait(wait) => {
                debug!(wait_event_id = %wait.event_id, "Registered confirmation wait");
                if let Some(previous) = self.pending.replace(wait) {
                    error!(wait_event_id = %previous.event_id, "Replacing an outstanding wait");
                    previous.deliver(Err(ConfirmationError::TrackerClosed));
                }
            }
        }
    }

    fn handle_item(&mut self, item: TransportItem) {
        match classify(item, &self.event_id, self.latest_block.as_ref()) {
            Verdict::Skip(Skip::Undecodable(err)) => {
                warn!(error = %err, "Skipping undecodable transport message");
            }
            Verdict::Skip(Skip::Unrecognized(kind)) => {
                warn!(kind = %kind, "Skipping result that is not an event");
            }
            Verdict::Skip(Skip::BeforeFirstBlock(topic)) => {
                trace!(topic = %topic, "Skipping event received before the first block");
            }
            Verdict::Skip(Skip::Unsolicited(topic)) => {
                warn!(topic = %topic, expected = %self.event_id, "Received unsolicited event");
            }
            Verdict::BlockObserved(block) => {
                debug!(
                    block_hash = %block.hash,
                    height = block.metadata.height,
                    "Registered new block"
                );
                self.latest_block = Some(block.hash.clone());
                self.block_hash.send_replace(Some(block.hash));
            }
            Verdict::Resolve(confirmation) => self.resolve(confirmation),
        }
    }

    fn resolve(&mut self, confirmation: Confirmation) {
        let Some(wait) = self.pending.take() else {
            debug!("No wait outstanding, dropping matched event");
            return;
        };
        // Released before the write so a caller that observes the confirmation may wait again.
        self.state.release_wait();
        wait.deliver(confirmation);
    }

    /// Fails every wait still outstanding or queued with `reason`.
    fn finish(&mut self, reason: &ConfirmationError) {
        self.state.mark_closed();
        self.commands.close();

        if let Some(wait) = self.pending.take() {
            wait.deliver(Err(reason.clone()));
        }
        while let Ok(Command::Wait(wait)) = self.commands.try_recv() {
            wait.deliver(Err(reason.clone()));
        }

        self.state.release_wait();
        info!(reason = %reason, "Consumption loop stopped");
    }
}

async fn abandoned(pending: &mut Option<PendingWait>) {
    match pending {
        Some(wait) => wait.abandoned().await,
        None => std::future::pending().await,
    }
}
