//! Error types for every layer of the client.
//!
//! Each layer owns its enum and wraps the one below it with `#[source]`, so a
//! failed creation can be traced down to the slot write or HTTP status that
//! caused it.

use std::error::Error;
use std::time::Duration;

/// Boxed error coming out of an HTTP implementation.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Failure talking to the hub's REST API.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The request never produced a response (DNS, TCP, TLS, timeout).
    #[error("failed to reach hub: {0}")]
    Connect(#[source] BoxError),

    /// The hub answered with a non-2xx status. Error bodies are not parsed.
    #[error("hub returned HTTP {0}")]
    Status(u16),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure accessing one of the relay slots.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("slot {slot}: {source}")]
    Hub {
        slot: usize,
        #[source]
        source: HubError,
    },
}

/// Failure publishing a discovery envelope.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The envelope does not fit in the data slots. Nothing was written.
    #[error("discovery envelope is {len} characters, channel holds {capacity}")]
    TooLarge { len: usize, capacity: usize },

    /// At least one slot write failed. Earlier writes are not rolled back.
    #[error("slot write failed: {0}")]
    Slot(#[from] ChannelError),

    #[error("failed to encode discovery envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Reason a control was not created. The registry is unchanged in every case.
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("registry is at capacity ({capacity} controls)")]
    AtCapacity { capacity: usize },

    #[error("object id must not be empty")]
    EmptyObjectId,

    #[error("{entity_id} already exists on the hub")]
    AlreadyExists { entity_id: String },

    #[error("failed to publish discovery for {entity_id}: {source}")]
    Publish {
        entity_id: String,
        #[source]
        source: PublishError,
    },

    #[error("{entity_id} was not created within {timeout:?}")]
    NotConfirmed {
        entity_id: String,
        timeout: Duration,
    },
}

/// Failure reading or writing the live state of a control.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The handle does not refer to a control in this registry.
    #[error("unknown control")]
    UnknownControl,

    #[error("{entity_id} is offline")]
    Offline { entity_id: String },

    #[error(transparent)]
    Hub(#[from] HubError),
}
