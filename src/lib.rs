//! Confirmation-Tracker resolves transaction confirmations from a node's event-subscription
//! feed.
//!
//! The main entry point is [`ConfirmationTracker`], built via [`ConfirmationTrackerBuilder`] for
//! a single [`EventId`] (for example [`EventId::account_input`]) on top of a [`Transport`].
//!
//! After connecting, call [`ConfirmationTracker::wait_for_confirmation`] to obtain a
//! [`ConfirmationReceiver`], then await it for the [`Confirmation`].
//!
//! # Classification
//!
//! A single background task reads the transport's result stream in arrival order:
//!
//! - Undecodable messages and results that are not events are logged and skipped.
//! - Block notifications update the latest block hash and never resolve a wait.
//! - Events are ignored until at least one block has been observed.
//! - Events on other topics are logged as unsolicited and skipped.
//! - An event on the tracked topic resolves the outstanding wait: with [`Confirmed`] when it
//!   carries a transaction event, otherwise with
//!   [`ConfirmationError::UnexpectedPayloadShape`].
//!
//! No stream item ever stops the loop; only [`ConfirmationTracker::close`] or the end of the
//! transport stream does.
//!
//! # Delivery
//!
//! One wait may be outstanding at a time and it is resolved exactly once. Closing the tracker
//! resolves it with [`ConfirmationError::TrackerClosed`]; the transport stream ending resolves
//! it with [`ConfirmationError::TransportClosed`]. Matching events that arrive while no wait is
//! outstanding are dropped.
//!
//! # Transports
//!
//! Connection handling and wire decoding are the job of a [`Transport`] implementation. The
//! `test-utils` feature provides an in-memory one in [`test_utils`].

#[macro_use]
mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod error;
mod tracker;
mod transport;
mod types;

pub use error::{ConfirmationError, DecodeError, TrackerError, TransportError};
pub use tracker::{
    ConfirmationReceiver, ConfirmationTracker, ConfirmationTrackerBuilder,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use transport::Transport;
pub use types::{
    BlockHash, BlockMetadata, CallEvent, Confirmation, Confirmed, EventId, EventPayload, LogEvent,
    NamedEvent, NewBlock, RawResult, TransportItem, TxEvent,
};
