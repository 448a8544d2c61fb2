mod common;

use confirmation_tracker::{
    ConfirmationError, EventId, EventPayload, assert_block_hash, assert_confirmed, assert_failed,
    assert_pending,
};

use crate::common::{OTHER_ACCOUNT, block_hash, call_event, setup_tracker, tracked_id, tx_event};

#[tokio::test]
async fn confirms_tracked_event_after_block() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), tx_event(1));

    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    Ok(())
}

#[tokio::test]
async fn confirmation_carries_latest_block_hash() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_block(block_hash(1));
    transport.push_block(block_hash(2));
    transport.push_block(block_hash(3));
    transport.push_event(tracked_id(), tx_event(1));

    assert_confirmed!(receiver, block_hash(3), tx_event(1));
    assert_eq!(tracker.latest_block_hash(), Some(block_hash(3)));

    Ok(())
}

#[tokio::test]
async fn events_before_first_block_are_ignored() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_event(tracked_id(), tx_event(1));
    assert_pending!(receiver);

    // a block alone never resolves the wait
    transport.push_block(block_hash(1));
    assert_block_hash!(tracker, block_hash(1));
    assert_pending!(receiver);

    transport.push_event(tracked_id(), tx_event(2));
    assert_confirmed!(receiver, block_hash(1), tx_event(2));

    Ok(())
}

#[tokio::test]
async fn unsolicited_topics_are_skipped() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_block(block_hash(1));
    transport.push_event(EventId::account_input(OTHER_ACCOUNT), tx_event(9));
    transport.push_event(EventId::log(OTHER_ACCOUNT), tx_event(8));
    assert_pending!(receiver);

    transport.push_event(tracked_id(), tx_event(1));
    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    Ok(())
}

#[tokio::test]
async fn malformed_items_do_not_stop_the_loop() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_decode_error("truncated frame");
    transport.push_unrecognized("tendermint/event/Vote");
    transport.push_block(block_hash(1));
    transport.push_decode_error("unknown type byte");
    transport.push_unrecognized("tendermint/event/Vote");
    assert_pending!(receiver);

    transport.push_event(tracked_id(), tx_event(1));
    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    Ok(())
}

#[tokio::test]
async fn non_transaction_payload_fails_the_wait() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), call_event(1));

    assert_failed!(
        receiver,
        ConfirmationError::UnexpectedPayloadShape { observed: EventPayload::Call(call_event(1)) }
    );
    assert!(!tracker.is_closed());

    Ok(())
}

#[tokio::test]
async fn unexpected_payload_is_reported_in_the_error() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let receiver = tracker.wait_for_confirmation(tracked_id())?;

    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), call_event(4));

    match receiver.await {
        Err(ConfirmationError::UnexpectedPayloadShape { observed }) => {
            assert_eq!(observed, EventPayload::Call(call_event(4)));
        }
        other => panic!("Expected UnexpectedPayloadShape, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn block_updates_only_apply_to_later_events() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;

    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;
    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), tx_event(1));
    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;
    transport.push_event(tracked_id(), tx_event(2));
    transport.push_block(block_hash(2));
    assert_confirmed!(receiver, block_hash(1), tx_event(2));

    assert_block_hash!(tracker, block_hash(2));

    Ok(())
}

#[tokio::test]
async fn each_wait_resolves_exactly_once() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;

    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;
    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), tx_event(1));
    transport.push_event(tracked_id(), tx_event(2));
    transport.push_event(tracked_id(), tx_event(3));
    transport.push_block(block_hash(2));

    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    // events 2 and 3 arrived with no wait outstanding and were dropped
    assert_block_hash!(tracker, block_hash(2));
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;
    assert_pending!(receiver);

    transport.push_event(tracked_id(), tx_event(4));
    assert_confirmed!(receiver, block_hash(2), tx_event(4));

    Ok(())
}

#[tokio::test]
async fn try_recv_reports_pending_then_confirmation() -> anyhow::Result<()> {
    let (tracker, transport) = setup_tracker().await?;
    let mut receiver = tracker.wait_for_confirmation(tracked_id())?;
    assert!(receiver.try_recv().is_none());
    assert_eq!(receiver.event_id(), &tracked_id());

    transport.push_block(block_hash(1));
    transport.push_event(tracked_id(), tx_event(1));
    assert_confirmed!(receiver, block_hash(1), tx_event(1));

    Ok(())
}
