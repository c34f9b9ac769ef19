//! Discovery over the slot side-channel.
//!
//! The hub's native discovery transport is out of reach, so a discovery
//! envelope is cut into pieces and written to text helper entities on the hub.
//! An automation on the hub side (not part of this crate) waits for the ready
//! sentinel, reassembles the pieces and performs the real registration. This
//! module writes the pieces and then polls until the new entity shows up.

mod channel;
mod confirm;
mod publisher;
mod scan;

pub use channel::slot_entity_id;
pub use channel::Channel;
pub use channel::DATA_SLOTS;
pub use channel::DEFAULT_SLOT_SIZE;
pub use channel::READY_SENTINEL;
pub use channel::SENTINEL_SLOT;
pub use confirm::wait_for_entity;
pub use confirm::PollSchedule;
pub use publisher::envelope;
pub use publisher::partition;
pub use publisher::publish;
pub use scan::extract_value;
