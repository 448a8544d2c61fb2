#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, address};
use confirmation_tracker::{
    BlockHash, CallEvent, ConfirmationTracker, ConfirmationTrackerBuilder, EventId, TxEvent,
    test_utils::{MockTransport, MockTransportHandle},
};
use tracing_subscriber::EnvFilter;

pub const SENDER: Address = address!("0x00000000000000000000000000000000000000a1");
pub const OTHER_ACCOUNT: Address = address!("0x00000000000000000000000000000000000000b2");

pub type TestTracker = ConfirmationTracker<MockTransport>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Topic of transactions sent by [`SENDER`].
pub fn tracked_id() -> EventId {
    EventId::account_input(SENDER)
}

pub fn block_hash(n: u8) -> BlockHash {
    BlockHash::from(vec![n; 32])
}

pub fn tx_event(n: u8) -> TxEvent {
    TxEvent {
        tx_hash: B256::repeat_byte(n),
        tx: Bytes::from(vec![0xf8, n]),
        return_data: Bytes::new(),
        exception: None,
    }
}

pub fn call_event(n: u8) -> CallEvent {
    CallEvent {
        caller: SENDER,
        callee: OTHER_ACCOUNT,
        data: Bytes::from(vec![n]),
        value: u64::from(n),
        gas: 21_000,
        ..Default::default()
    }
}

pub async fn setup_tracker() -> anyhow::Result<(TestTracker, MockTransportHandle)> {
    setup_tracker_with(ConfirmationTrackerBuilder::new(tracked_id())).await
}

pub async fn setup_tracker_with(
    builder: ConfirmationTrackerBuilder,
) -> anyhow::Result<(TestTracker, MockTransportHandle)> {
    init_tracing();
    let (transport, handle) = MockTransport::new();
    let tracker = builder.connect(transport).await?;
    Ok((tracker, handle))
}
