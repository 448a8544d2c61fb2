//! Helpers for testing code built on the tracker.
//!
//! [`MockTransport`] stands in for a node connection, and the `assert_*` macros check what a
//! [`ConfirmationReceiver`](crate::ConfirmationReceiver) resolves to.

pub mod macros;
mod mock_transport;

pub use mock_transport::{MOCK_CHAIN_ID, MockTransport, MockTransportHandle};
