use super::scan::extract_value;
use crate::error::ChannelError;
use crate::hub::HttpClient;
use crate::hub::HubApi;

/// Number of slots carrying envelope data.
pub const DATA_SLOTS: usize = 5;

/// Slot that receives [`READY_SENTINEL`] once all data slots are written.
pub const SENTINEL_SLOT: usize = 6;

/// Value telling the hub-side decoder that the data slots are complete.
pub const READY_SENTINEL: &str = "END";

/// Default characters per slot, matching the hub's text entity limit.
pub const DEFAULT_SLOT_SIZE: usize = 255;

const SLOT_ENTITY_PREFIX: &str = "input_text.mqtt_buffer_";

/// Entity id of slot `index` (1-based), or `None` if there is no such slot.
pub fn slot_entity_id(index: usize) -> Option<String> {
    (1..=SENTINEL_SLOT)
        .contains(&index)
        .then(|| format!("{}{}", SLOT_ENTITY_PREFIX, index))
}

/// Read/write access to the relay slots.
///
/// The slots are one shared resource on the hub with no locking; two
/// publishers writing at the same time will interleave their pieces.
#[derive(Debug)]
pub struct Channel<'a, C> {
    hub: &'a HubApi<C>,
    slot_size: usize,
}

impl<'a, C: HttpClient> Channel<'a, C> {
    pub fn new(hub: &'a HubApi<C>, slot_size: usize) -> Self {
        Self { hub, slot_size }
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Characters the data slots can carry together.
    pub fn capacity(&self) -> usize {
        DATA_SLOTS * self.slot_size
    }

    pub async fn write_slot(&self, index: usize, content: &str) -> Result<(), ChannelError> {
        let entity_id = slot_entity_id(index).ok_or(ChannelError::InvalidSlot(index))?;
        self.hub
            .post_state(&entity_id, content)
            .await
            .map_err(|source| ChannelError::Hub {
                slot: index,
                source,
            })
    }

    /// Current content of slot `index`.
    pub async fn read_slot(&self, index: usize) -> Result<String, ChannelError> {
        let entity_id = slot_entity_id(index).ok_or(ChannelError::InvalidSlot(index))?;
        let body = self
            .hub
            .get_state(&entity_id)
            .await
            .map_err(|source| ChannelError::Hub {
                slot: index,
                source,
            })?;
        Ok(extract_value(&body, "state").unwrap_or_default().to_string())
    }

    /// Write the ready sentinel to the last slot.
    pub async fn signal_ready(&self) -> Result<(), ChannelError> {
        self.write_slot(SENTINEL_SLOT, READY_SENTINEL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::mock::MockHub;

    #[test]
    fn test_slot_entity_ids() {
        assert_eq!(slot_entity_id(1).unwrap(), "input_text.mqtt_buffer_1");
        assert_eq!(slot_entity_id(6).unwrap(), "input_text.mqtt_buffer_6");
        assert_eq!(slot_entity_id(0), None);
        assert_eq!(slot_entity_id(7), None);
    }

    #[tokio::test]
    async fn test_write_then_read_slot() {
        let hub = HubApi::new(MockHub::new(), "http://hub", "t");
        let channel = Channel::new(&hub, DEFAULT_SLOT_SIZE);

        channel.write_slot(2, "{\"topic\":").await.unwrap();
        // The scanner stops at the first unescaped quote and does not decode.
        assert_eq!(channel.read_slot(2).await.unwrap(), "{\\\"topic\\\":");
        assert_eq!(channel.capacity(), 1275);
    }

    #[tokio::test]
    async fn test_invalid_slot_makes_no_request() {
        let hub = HubApi::new(MockHub::new(), "http://hub", "t");
        let channel = Channel::new(&hub, DEFAULT_SLOT_SIZE);

        let err = channel.write_slot(7, "x").await.unwrap_err();
        assert!(matches!(err, ChannelError::InvalidSlot(7)));
        assert!(hub.client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_signal_ready() {
        let hub = HubApi::new(MockHub::new(), "http://hub", "t");
        let channel = Channel::new(&hub, DEFAULT_SLOT_SIZE);

        channel.signal_ready().await.unwrap();
        assert_eq!(
            hub.client().value("input_text.mqtt_buffer_6").unwrap(),
            "END"
        );
    }
}
