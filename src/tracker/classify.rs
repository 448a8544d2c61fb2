use crate::{
    error::{ConfirmationError, DecodeError},
    types::{
        BlockHash, Confirmation, Confirmed, EventId, EventPayload, NewBlock, RawResult,
        TransportItem,
    },
};

/// What the consumption loop should do with one transport item.
#[derive(Debug, PartialEq)]
pub(crate) enum Verdict {
    Skip(Skip),
    BlockObserved(NewBlock),
    Resolve(Confirmation),
}

/// Reasons an item is dropped without affecting the pending wait.
#[derive(Debug, PartialEq)]
pub(crate) enum Skip {
    Undecodable(DecodeError),
    Unrecognized(String),
    BeforeFirstBlock(EventId),
    Unsolicited(EventId),
}

/// Classifies `item` against the tracked event id and the latest observed block.
///
/// Rules apply in order: decode failures and unrecognized shapes are skipped, block
/// notifications update the block hash, events are distrusted until a block has been observed,
/// events on other topics are unsolicited, and a tracked event resolves the wait with either
/// its transaction payload or an unexpected-shape failure.
pub(crate) fn classify(
    item: TransportItem,
    tracked: &EventId,
    latest_block: Option<&BlockHash>,
) -> Verdict {
    let result = match item {
        Ok(result) => result,
        Err(err) => return Verdict::Skip(Skip::Undecodable(err)),
    };

    let event = match result {
        RawResult::NewBlock(block) => return Verdict::BlockObserved(block),
        RawResult::Unrecognized { kind } => return Verdict::Skip(Skip::Unrecognized(kind)),
        RawResult::Event(event) => event,
    };

    // No event is trusted until at least one block has been observed.
    let Some(block_hash) = latest_block else {
        return Verdict::Skip(Skip::BeforeFirstBlock(event.topic));
    };

    if event.topic != *tracked {
        return Verdict::Skip(Skip::Unsolicited(event.topic));
    }

    match event.payload {
        EventPayload::Tx(tx) => {
            Verdict::Resolve(Ok(Confirmed { block_hash: block_hash.clone(), event: tx }))
        }
        observed => Verdict::Resolve(Err(ConfirmationError::UnexpectedPayloadShape { observed })),
    }
}
