use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll},
};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::{
    error::ConfirmationError,
    types::{Confirmation, EventId},
};

/// Flags shared between the tracker handle and its consumption loop.
#[derive(Debug, Default)]
pub(crate) struct TrackerState {
    wait_reserved: AtomicBool,
    closed: AtomicBool,
}

impl TrackerState {
    /// Claims the single wait slot. Returns `false` if a wait is already outstanding.
    pub(crate) fn try_reserve_wait(&self) -> bool {
        self.wait_reserved.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub(crate) fn release_wait(&self) {
        self.wait_reserved.store(false, Ordering::Release);
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// The outstanding request of a caller, owned by the consumption loop once registered.
///
/// Delivery consumes the wait, so a second write cannot be expressed.
#[derive(Debug)]
pub(crate) struct PendingWait {
    pub(crate) event_id: EventId,
    sender: oneshot::Sender<Confirmation>,
}

impl PendingWait {
    pub(crate) fn new(event_id: EventId) -> (Self, ConfirmationReceiver) {
        let (sender, receiver) = oneshot::channel();
        let receiver = ConfirmationReceiver { event_id: event_id.clone(), inner: Some(receiver) };
        (Self { event_id, sender }, receiver)
    }

    pub(crate) fn deliver(self, confirmation: Confirmation) {
        match &confirmation {
            Ok(confirmed) => info!(
                event_id = %self.event_id,
                block_hash = %confirmed.block_hash,
                tx_hash = %confirmed.event.tx_hash,
                "Delivering confirmation"
            ),
            Err(err) => info!(event_id = %self.event_id, error = %err, "Delivering failed confirmation"),
        }
        if self.sender.send(confirmation).is_err() {
            debug!(event_id = %self.event_id, "Confirmation receiver dropped before delivery");
        }
    }

    /// Resolves once the caller has dropped its [`ConfirmationReceiver`].
    pub(crate) async fn abandoned(&mut self) {
        self.sender.closed().await;
    }
}

/// Receiving half of a confirmation wait.
///
/// Await it to obtain the [`Confirmation`]. Exactly one value is ever produced; if the tracker
/// goes away without writing one, the receiver resolves to
/// [`ConfirmationError::TrackerClosed`] rather than pending forever.
///
/// Once the value has been handed out, by `await` or by [`try_recv`](Self::try_recv), the
/// receiver is spent: `try_recv` returns `None` and polling stays pending.
#[derive(Debug)]
#[must_use = "dropping the receiver abandons the wait"]
pub struct ConfirmationReceiver {
    event_id: EventId,
    inner: Option<oneshot::Receiver<Confirmation>>,
}

impl ConfirmationReceiver {
    /// The event id this wait was issued for.
    #[must_use]
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Returns `true` once the confirmation has been handed out.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the confirmation if it has already been delivered, without waiting.
    ///
    /// Returns `None` while the wait is still outstanding, and after the confirmation has been
    /// returned once.
    pub fn try_recv(&mut self) -> Option<Confirmation> {
        let confirmation = match self.inner.as_mut()?.try_recv() {
            Ok(confirmation) => confirmation,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(ConfirmationError::TrackerClosed),
        };
        self.inner = None;
        Some(confirmation)
    }
}

impl Future for ConfirmationReceiver {
    type Output = Confirmation;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Pending;
        };
        let confirmation = match Pin::new(inner).poll(cx) {
            Poll::Ready(received) => received.unwrap_or(Err(ConfirmationError::TrackerClosed)),
            Poll::Pending => return Poll::Pending,
        };
        self.inner = None;
        Poll::Ready(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Bytes;

    use super::*;
    use crate::types::{BlockHash, Confirmed, TxEvent};

    fn confirmed() -> Confirmation {
        Ok(Confirmed {
            block_hash: BlockHash::from(vec![0xab; 4]),
            event: TxEvent { tx: Bytes::from_static(b"tx"), ..TxEvent::default() },
        })
    }

    #[test]
    fn wait_slot_admits_one_reservation_at_a_time() {
        let state = TrackerState::default();

        assert!(state.try_reserve_wait());
        assert!(!state.try_reserve_wait());

        state.release_wait();
        assert!(state.try_reserve_wait());
    }

    #[test]
    fn closed_flag_is_sticky() {
        let state = TrackerState::default();
        assert!(!state.is_closed());

        state.mark_closed();
        state.mark_closed();
        assert!(state.is_closed());
    }

    #[tokio::test]
    async fn receiver_yields_the_delivered_confirmation() {
        let (wait, receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        assert_eq!(receiver.event_id(), &EventId::from("Acc/01/Input"));

        wait.deliver(confirmed());

        assert_eq!(receiver.await, confirmed());
    }

    #[tokio::test]
    async fn receiver_resolves_to_tracker_closed_when_wait_is_dropped() {
        let (wait, receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        drop(wait);

        assert_eq!(receiver.await, Err(ConfirmationError::TrackerClosed));
    }

    #[test]
    fn try_recv_reports_outstanding_then_delivered() {
        let (wait, mut receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        assert!(receiver.try_recv().is_none());

        wait.deliver(confirmed());

        assert_eq!(receiver.try_recv(), Some(confirmed()));
    }

    #[test]
    fn try_recv_hands_out_the_confirmation_once() {
        let (wait, mut receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        wait.deliver(confirmed());

        assert_eq!(receiver.try_recv(), Some(confirmed()));
        assert!(receiver.is_terminated());
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn try_recv_reports_closed_once() {
        let (wait, mut receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        drop(wait);

        assert_eq!(receiver.try_recv(), Some(Err(ConfirmationError::TrackerClosed)));
        assert_eq!(receiver.try_recv(), None);
    }

    #[tokio::test]
    async fn awaiting_after_try_recv_stays_pending() {
        let (wait, mut receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        wait.deliver(confirmed());
        assert_eq!(receiver.try_recv(), Some(confirmed()));

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), &mut receiver).await;

        assert!(outcome.is_err(), "spent receiver produced {outcome:?}");
    }

    #[tokio::test]
    async fn awaiting_twice_does_not_produce_a_second_value() {
        let (wait, mut receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        wait.deliver(confirmed());

        assert_eq!((&mut receiver).await, confirmed());
        assert!(receiver.is_terminated());

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), &mut receiver).await;
        assert!(outcome.is_err(), "spent receiver produced {outcome:?}");
        assert_eq!(receiver.try_recv(), None);
    }

    #[tokio::test]
    async fn abandoned_resolves_after_receiver_drop() {
        let (mut wait, receiver) = PendingWait::new(EventId::from("Acc/01/Input"));
        drop(receiver);

        tokio::time::timeout(std::time::Duration::from_secs(1), wait.abandoned())
            .await
            .expect("abandoned wait was not detected");
    }
}
