use std::fmt;

use alloy::primitives::{Address, B256, Bytes, hex};

use crate::error::{ConfirmationError, DecodeError};

/// Logical subscription topic a tracker watches for.
///
/// Any string the node accepts as an event id works. The constructors below build the ids the
/// node publishes for account activity and block production.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(String);

impl EventId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Transactions that spend from `address`.
    #[must_use]
    pub fn account_input(address: Address) -> Self {
        Self(format!("Acc/{}/Input", hex::encode_upper(address)))
    }

    /// Transactions that send to `address`.
    #[must_use]
    pub fn account_output(address: Address) -> Self {
        Self(format!("Acc/{}/Output", hex::encode_upper(address)))
    }

    /// Calls into the contract at `address`.
    #[must_use]
    pub fn account_call(address: Address) -> Self {
        Self(format!("Acc/{}/Call", hex::encode_upper(address)))
    }

    /// Logs emitted by the contract at `address`.
    #[must_use]
    pub fn log(address: Address) -> Self {
        Self(format!("Log/{}", hex::encode_upper(address)))
    }

    /// Block production notifications.
    #[must_use]
    pub fn new_block() -> Self {
        Self("NewBlock".to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for EventId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Opaque hash of an observed block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockHash(Bytes);

impl BlockHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Bytes> for BlockHash {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for BlockHash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for BlockHash {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<B256> for BlockHash {
    fn from(hash: B256) -> Self {
        Self(Bytes::copy_from_slice(hash.as_slice()))
    }
}

/// Header fields carried alongside a block notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMetadata {
    pub height: u64,
    pub chain_id: String,
    pub num_txs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlock {
    pub hash: BlockHash,
    pub metadata: BlockMetadata,
}

/// An event published on a subscribed topic.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEvent {
    pub topic: EventId,
    pub payload: EventPayload,
}

/// A decoded item from the transport, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    NewBlock(NewBlock),
    Event(NamedEvent),
    /// A well-formed message that is not an event (e.g. an RPC acknowledgement).
    Unrecognized { kind: String },
}

impl RawResult {
    #[must_use]
    pub fn new_block(hash: impl Into<BlockHash>, metadata: BlockMetadata) -> Self {
        Self::NewBlock(NewBlock { hash: hash.into(), metadata })
    }

    #[must_use]
    pub fn event(topic: impl Into<EventId>, payload: impl Into<EventPayload>) -> Self {
        Self::Event(NamedEvent { topic: topic.into(), payload: payload.into() })
    }
}

/// Item type of a transport's result stream.
pub type TransportItem = Result<RawResult, DecodeError>;

/// Payload carried by a [`NamedEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Tx(TxEvent),
    Call(CallEvent),
    Log(LogEvent),
    /// A payload type this crate does not model, kept for diagnostics.
    Other { kind: String, value: String },
}

impl EventPayload {
    /// Short name of the payload type, used in logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            EventPayload::Tx(_) => "tx",
            EventPayload::Call(_) => "call",
            EventPayload::Log(_) => "log",
            EventPayload::Other { kind, .. } => kind,
        }
    }
}

impl From<TxEvent> for EventPayload {
    fn from(event: TxEvent) -> Self {
        EventPayload::Tx(event)
    }
}

impl From<CallEvent> for EventPayload {
    fn from(event: CallEvent) -> Self {
        EventPayload::Call(event)
    }
}

impl From<LogEvent> for EventPayload {
    fn from(event: LogEvent) -> Self {
        EventPayload::Log(event)
    }
}

/// A transaction included in a block, as reported on account topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxEvent {
    pub tx_hash: B256,
    /// Encoded transaction.
    pub tx: Bytes,
    pub return_data: Bytes,
    /// Execution error, if the transaction was included but failed.
    pub exception: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallEvent {
    pub caller: Address,
    pub callee: Address,
    pub data: Bytes,
    pub value: u64,
    pub gas: u64,
    pub return_data: Bytes,
    pub exception: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEvent {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub height: u64,
}

/// A transaction event together with the block it was confirmed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub block_hash: BlockHash,
    pub event: TxEvent,
}

/// Terminal result of a confirmation wait.
pub type Confirmation = Result<Confirmed, ConfirmationError>;
