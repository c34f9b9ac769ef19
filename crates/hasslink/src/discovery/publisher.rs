use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::channel::Channel;
use super::channel::DATA_SLOTS;
use crate::entity::to_discovery_json;
use crate::entity::Control;
use crate::error::ChannelError;
use crate::error::PublishError;
use crate::hub::HttpClient;

#[derive(Serialize)]
struct Envelope<'a> {
    topic: &'a str,
    payload: &'a Control,
}

/// Build the discovery envelope `{"topic":"...","payload":{...}}` for `control`.
pub fn envelope(control: &Control, prefix: &str) -> Result<String, serde_json::Error> {
    let topic = control.discovery_topic(prefix);
    to_discovery_json(&Envelope {
        topic: &topic,
        payload: control,
    })
}

/// Cut `envelope` into exactly [`DATA_SLOTS`] pieces of at most `slot_size`
/// characters. Pieces past the end of the envelope are empty.
///
/// Returns `None` if the envelope does not fit.
pub fn partition(envelope: &str, slot_size: usize) -> Option<[&str; DATA_SLOTS]> {
    let mut pieces = [""; DATA_SLOTS];
    let mut rest = envelope;

    for piece in pieces.iter_mut() {
        let split = rest
            .char_indices()
            .nth(slot_size)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(split);
        *piece = head;
        rest = tail;
    }

    rest.is_empty().then_some(pieces)
}

/// Write `envelope` across the data slots and then signal the decoder.
///
/// Oversized envelopes are rejected before any request is made. Otherwise
/// every slot write is attempted, in order, even after a failure (stale
/// content in later slots would be worse), and the first failure is returned.
/// Writes that already succeeded are not undone.
pub async fn publish<C: HttpClient>(
    channel: &Channel<'_, C>,
    envelope: &str,
) -> Result<(), PublishError> {
    let pieces = partition(envelope, channel.slot_size()).ok_or_else(|| {
        let err = PublishError::TooLarge {
            len: envelope.chars().count(),
            capacity: channel.capacity(),
        };
        warn!("Discovery payload too large: {}", err);
        err
    })?;

    let mut first_error: Option<ChannelError> = None;

    for (i, piece) in pieces.iter().enumerate() {
        let slot = i + 1;
        debug!("Writing {} characters to slot {}", piece.chars().count(), slot);
        if let Err(e) = channel.write_slot(slot, piece).await {
            warn!("Failed to write slot {}: {}", slot, e);
            first_error.get_or_insert(e);
        }
    }

    if let Err(e) = channel.signal_ready().await {
        warn!("Failed to write ready sentinel: {}", e);
        first_error.get_or_insert(e);
    }

    match first_error {
        Some(e) => Err(PublishError::Slot(e)),
        None => Ok(()),
    }
}
