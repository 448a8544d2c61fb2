use std::mem::discriminant;

use thiserror::Error;

use crate::types::{Confirmation, EventId, EventPayload};

/// Errors returned synchronously by the tracker API.
///
/// These never travel through a [`ConfirmationReceiver`](crate::ConfirmationReceiver); a
/// wait that was accepted is always resolved with a [`Confirmation`] instead.
#[derive(Error, Debug, Clone)]
pub enum TrackerError {
    /// The transport adapter refused a subscribe or unsubscribe request.
    #[error("Subscription error: {0}")]
    Subscription(TransportError),

    /// The transport adapter reported an error on its error side channel.
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// The tracker was closed, or the adapter's result stream has ended.
    #[error("Tracker closed")]
    Closed,

    /// A confirmation wait is already outstanding on this tracker.
    #[error("A confirmation wait is already outstanding")]
    WaitInProgress,

    /// The requested event id is not the one this tracker is bound to.
    #[error("Event id {requested} does not match tracked event id {tracked}")]
    EventIdMismatch { requested: EventId, tracked: EventId },

    /// The adapter's result stream was already taken by another consumer.
    #[error("Transport result stream is unavailable")]
    ResultsUnavailable,
}

/// Terminal failure of a single confirmation wait.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfirmationError {
    /// The tracked topic fired, but its payload is not a transaction event.
    #[error("Expected a transaction event payload, observed {} ({observed:?})", .observed.kind())]
    UnexpectedPayloadShape { observed: EventPayload },

    /// The tracker was closed while the wait was outstanding.
    #[error("Tracker closed before a confirmation was observed")]
    TrackerClosed,

    /// The adapter's result stream ended while the wait was outstanding.
    #[error("Transport result stream ended before a confirmation was observed")]
    TransportClosed,
}

/// Errors reported by a [`Transport`](crate::Transport) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The node rejected the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The underlying connection failed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The adapter has been stopped.
    #[error("Transport stopped")]
    Stopped,
}

/// A wire message that could not be decoded into a [`RawResult`](crate::RawResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode transport message: {reason}")]
pub struct DecodeError {
    pub reason: String,
}

impl DecodeError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl PartialEq<ConfirmationError> for Confirmation {
    fn eq(&self, other: &ConfirmationError) -> bool {
        match self {
            Ok(_) => false,
            Err(err) => discriminant(err) == discriminant(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Bytes, address};

    use super::*;
    use crate::types::{BlockHash, Confirmed, LogEvent, TxEvent};

    #[test]
    fn unexpected_payload_shape_names_the_observed_kind() {
        let observed = EventPayload::Log(LogEvent {
            address: address!("0x00000000000000000000000000000000000000aa"),
            topics: vec![],
            data: Bytes::new(),
            height: 7,
        });
        let err = ConfirmationError::UnexpectedPayloadShape { observed };

        let rendered = err.to_string();
        assert!(rendered.starts_with("Expected a transaction event payload, observed log"));
    }

    #[test]
    fn confirmation_compares_against_error_kind_only() {
        let failed: Confirmation = Err(ConfirmationError::UnexpectedPayloadShape {
            observed: EventPayload::Other { kind: "bond".into(), value: "{}".into() },
        });
        let probe = ConfirmationError::UnexpectedPayloadShape {
            observed: EventPayload::Other { kind: "unbond".into(), value: String::new() },
        };

        assert_eq!(failed, probe);
        assert_ne!(failed, ConfirmationError::TrackerClosed);

        let confirmed: Confirmation = Ok(Confirmed {
            block_hash: BlockHash::from(vec![1u8, 2, 3]),
            event: TxEvent::default(),
        });
        assert_ne!(confirmed, ConfirmationError::TrackerClosed);
    }

    #[test]
    fn event_id_mismatch_renders_both_ids() {
        let err = TrackerError::EventIdMismatch {
            requested: EventId::from("Acc/01/Input"),
            tracked: EventId::from("Acc/02/Input"),
        };

        assert_eq!(
            err.to_string(),
            "Event id Acc/01/Input does not match tracked event id Acc/02/Input"
        );
    }
}
